//! MongoDB structural context resolution.

use super::catalog::{BOOLEAN_KEYS, COLLECTION_KEYS};
use super::scanner::{Frame, MongoScan};
use crate::error::validate_request;
use crate::types::{MongoContext, MongoContextKind};

const PIPELINE_KEYS: &[&str] = &["pipeline", "aggregate"];

const QUERY_KEYS: &[&str] = &[
    "filter", "query", "find", "q", "$match", "$elemMatch", "$and", "$or", "$nor", "$not",
];
const UPDATE_KEYS: &[&str] = &[
    "update",
    "u",
    "$set",
    "$unset",
    "$inc",
    "$mul",
    "$rename",
    "$min",
    "$max",
    "$currentDate",
    "$setOnInsert",
    "$push",
    "$pull",
    "$addToSet",
    "$pop",
    "$pullAll",
];
const PROJECTION_KEYS: &[&str] = &["projection", "fields"];
const SORT_KEYS: &[&str] = &["sort", "$sort"];
const PROJECT_STAGES: &[&str] = &["$project", "$addFields", "$set"];

/// Resolves the completion context at `cursor` (a byte offset).
///
/// Only the text before the cursor is read. An invalid cursor yields an
/// `unknown` context.
pub fn mongo_context(text: &str, cursor: usize) -> MongoContext {
    if validate_request(text, cursor).is_err() {
        return MongoContext::empty();
    }
    resolve(&MongoScan::scan(&text[..cursor]))
}

pub(crate) fn resolve(scan: &MongoScan) -> MongoContext {
    let frames = &scan.frames;
    let path: Vec<String> = frames
        .iter()
        .take(frames.len().saturating_sub(1))
        .filter_map(|frame| match frame {
            Frame::Object { key } => key.clone(),
            Frame::Array { .. } => None,
        })
        .collect();
    let current_key = scan.value_key();
    let in_array = matches!(frames.last(), Some(Frame::Array { .. }));

    let pipeline = pipeline_index(frames);
    let current_stage = pipeline.and_then(|idx| {
        let stage_frame = idx + 1;
        let open_in_stage = frames.len() > stage_frame + 1
            || (frames.len() == stage_frame + 1 && scan.after_colon);
        match frames.get(stage_frame) {
            Some(Frame::Object { key }) if open_in_stage => key.clone(),
            _ => None,
        }
    });
    let stage_depth = pipeline.map_or(0, |idx| frames.len().saturating_sub(idx + 2));

    let mut ctx = MongoContext {
        kind: MongoContextKind::Unknown,
        depth: frames.len(),
        current_word: scan.current_word().to_string(),
        in_string: scan.in_string(),
        after_colon: scan.after_colon,
        path,
        current_key,
        in_pipeline: pipeline.is_some(),
        current_stage,
        stage_depth,
        in_array,
        expects_field_path: false,
        collection: scan.collection.clone(),
    };
    ctx.kind = if scan.value_complete {
        MongoContextKind::Unknown
    } else {
        context_kind(&ctx, pipeline.map(|idx| frames.len() - idx))
    };
    ctx.expects_field_path = expects_field_path(&ctx);
    ctx
}

/// Index of the innermost array holding pipeline stages.
fn pipeline_index(frames: &[Frame]) -> Option<usize> {
    frames.iter().rposition(|frame| match frame {
        Frame::Array { owner: Some(owner) } => PIPELINE_KEYS.contains(&owner.as_str()),
        Frame::Array { owner: None } => false,
        Frame::Object { .. } => false,
    })
    .or_else(|| match frames.first() {
        Some(Frame::Array { .. }) => Some(0),
        _ => None,
    })
}

/// `frames_from_pipeline` counts the pipeline array itself: 1 means the
/// cursor is directly in the array, 2 inside a stage object.
fn context_kind(ctx: &MongoContext, frames_from_pipeline: Option<usize>) -> MongoContextKind {
    let value_position = ctx.after_colon || ctx.in_array;

    if let Some(level) = frames_from_pipeline {
        if level == 1 {
            return MongoContextKind::Pipeline;
        }
        let Some(stage) = ctx.current_stage.as_deref() else {
            return MongoContextKind::Stage;
        };
        if level == 2 {
            // `{"$unwind": |`
            return MongoContextKind::StageBody;
        }
        if ctx.stage_depth == 1 && ctx.after_colon && is_option_value(ctx.current_key.as_deref()) {
            return MongoContextKind::Value;
        }
        return match stage {
            "$group" if ctx.stage_depth == 1 && !value_position => MongoContextKind::Group,
            "$group" => MongoContextKind::GroupAccumulator,
            "$match" => MongoContextKind::Query,
            "$sort" => MongoContextKind::Sort,
            stage if PROJECT_STAGES.contains(&stage) => MongoContextKind::ProjectExpr,
            _ => MongoContextKind::StageBody,
        };
    }

    if ctx.depth == 0 {
        return MongoContextKind::Root;
    }
    if ctx.depth == 1 && !ctx.in_array {
        return if ctx.after_colon {
            MongoContextKind::Value
        } else {
            MongoContextKind::Root
        };
    }

    let nearest = ctx
        .current_key
        .iter()
        .chain(ctx.path.iter().rev())
        .find_map(|segment| classify_segment(segment));
    match nearest {
        Some(kind) => kind,
        None if ctx.after_colon && is_option_value(ctx.current_key.as_deref()) => {
            MongoContextKind::Value
        }
        None => MongoContextKind::Unknown,
    }
}

fn classify_segment(segment: &str) -> Option<MongoContextKind> {
    if QUERY_KEYS.contains(&segment) {
        Some(MongoContextKind::Query)
    } else if UPDATE_KEYS.contains(&segment) {
        Some(MongoContextKind::Update)
    } else if PROJECTION_KEYS.contains(&segment) {
        Some(MongoContextKind::Projection)
    } else if SORT_KEYS.contains(&segment) {
        Some(MongoContextKind::Sort)
    } else if segment == "$group" {
        Some(MongoContextKind::Group)
    } else {
        None
    }
}

fn is_option_value(key: Option<&str>) -> bool {
    key.is_some_and(|key| COLLECTION_KEYS.contains(&key) || BOOLEAN_KEYS.contains(&key))
}

fn expects_field_path(ctx: &MongoContext) -> bool {
    if ctx.path.iter().any(|segment| segment == "$expr")
        || ctx.current_key.as_deref() == Some("$expr")
    {
        return true;
    }
    let value_position = ctx.after_colon || ctx.in_array;
    value_position
        && matches!(
            ctx.kind,
            MongoContextKind::Group
                | MongoContextKind::GroupAccumulator
                | MongoContextKind::ProjectExpr
                | MongoContextKind::StageBody
        )
}
