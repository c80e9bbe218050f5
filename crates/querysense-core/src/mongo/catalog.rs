//! Compiled-in MongoDB operator catalogs.

/// A catalog entry. `common` entries get a small ranking bonus so they
/// survive bucket caps when nothing has been typed yet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OperatorSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub common: bool,
}

const fn op(name: &'static str, description: &'static str) -> OperatorSpec {
    OperatorSpec {
        name,
        description,
        common: false,
    }
}

const fn common(name: &'static str, description: &'static str) -> OperatorSpec {
    OperatorSpec {
        name,
        description,
        common: true,
    }
}

/// Aggregation stage with the body inserted when completing in pipeline position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StageSpec {
    pub spec: OperatorSpec,
    pub body: &'static str,
}

const fn stage(spec: OperatorSpec, body: &'static str) -> StageSpec {
    StageSpec { spec, body }
}

pub(crate) static STAGES: &[StageSpec] = &[
    stage(common("$match", "Filter documents"), "{}"),
    stage(common("$group", "Group documents by a key"), r#"{"_id": null}"#),
    stage(common("$project", "Reshape documents"), "{}"),
    stage(common("$sort", "Order documents"), "{}"),
    stage(common("$limit", "Keep the first n documents"), "10"),
    stage(common("$lookup", "Join another collection"), r#"{"from": "", "localField": "", "foreignField": "", "as": ""}"#),
    stage(common("$unwind", "One document per array element"), r#""$field""#),
    stage(op("$skip", "Skip the first n documents"), "0"),
    stage(op("$addFields", "Add computed fields"), "{}"),
    stage(op("$set", "Alias of $addFields"), "{}"),
    stage(op("$unset", "Remove fields"), r#""field""#),
    stage(op("$count", "Count documents into a field"), r#""count""#),
    stage(op("$facet", "Run sub-pipelines on the same input"), "{}"),
    stage(op("$bucket", "Group into fixed boundaries"), r#"{"groupBy": "", "boundaries": []}"#),
    stage(op("$bucketAuto", "Group into evenly sized buckets"), r#"{"groupBy": "", "buckets": 5}"#),
    stage(op("$sortByCount", "Group by value and sort by count"), r#""$field""#),
    stage(op("$replaceRoot", "Promote an embedded document"), r#"{"newRoot": ""}"#),
    stage(op("$replaceWith", "Replace the document"), r#""$field""#),
    stage(op("$sample", "Random sample"), r#"{"size": 10}"#),
    stage(op("$out", "Write results to a collection"), r#""collection""#),
    stage(op("$merge", "Merge results into a collection"), r#"{"into": ""}"#),
    stage(op("$graphLookup", "Recursive lookup"), "{}"),
    stage(op("$unionWith", "Append another collection"), r#"{"coll": ""}"#),
    stage(op("$setWindowFields", "Window computations"), "{}"),
    stage(op("$densify", "Fill gaps in a sequence"), "{}"),
    stage(op("$fill", "Populate missing values"), "{}"),
    stage(op("$redact", "Restrict content by expression"), "{}"),
    stage(op("$geoNear", "Order by distance"), "{}"),
];

pub(crate) static QUERY_OPERATORS: &[OperatorSpec] = &[
    common("$eq", "Equal to"),
    common("$ne", "Not equal to"),
    common("$gt", "Greater than"),
    common("$gte", "Greater than or equal"),
    common("$lt", "Less than"),
    common("$lte", "Less than or equal"),
    common("$in", "Matches any listed value"),
    common("$nin", "Matches none of the listed values"),
    common("$and", "All conditions hold"),
    common("$or", "Any condition holds"),
    common("$exists", "Field presence"),
    op("$nor", "No condition holds"),
    op("$not", "Negates a condition"),
    op("$type", "BSON type test"),
    op("$regex", "Regular expression match"),
    op("$expr", "Aggregation expression"),
    op("$elemMatch", "Array element matches all conditions"),
    op("$size", "Array length"),
    op("$all", "Array contains all values"),
    op("$mod", "Modulo test"),
    op("$text", "Text search"),
    op("$where", "JavaScript predicate"),
    op("$geoWithin", "Within a shape"),
    op("$geoIntersects", "Intersects a shape"),
    op("$near", "Near a point"),
];

pub(crate) static UPDATE_OPERATORS: &[OperatorSpec] = &[
    common("$set", "Set field values"),
    common("$unset", "Remove fields"),
    common("$inc", "Increment by an amount"),
    common("$push", "Append to an array"),
    common("$pull", "Remove matching array elements"),
    common("$addToSet", "Append unless present"),
    op("$mul", "Multiply by an amount"),
    op("$rename", "Rename fields"),
    op("$min", "Keep the smaller value"),
    op("$max", "Keep the larger value"),
    op("$currentDate", "Set to the current date"),
    op("$setOnInsert", "Set only when inserting"),
    op("$pop", "Remove the first or last element"),
    op("$pullAll", "Remove all listed values"),
];

pub(crate) static ACCUMULATORS: &[OperatorSpec] = &[
    common("$sum", "Sum of values"),
    common("$avg", "Average of values"),
    common("$min", "Minimum value"),
    common("$max", "Maximum value"),
    common("$push", "Array of values"),
    common("$first", "First value in the group"),
    common("$last", "Last value in the group"),
    common("$count", "Number of documents"),
    op("$addToSet", "Array of distinct values"),
    op("$stdDevPop", "Population standard deviation"),
    op("$stdDevSamp", "Sample standard deviation"),
    op("$mergeObjects", "Merge documents"),
    op("$top", "Top element by sort order"),
    op("$bottom", "Bottom element by sort order"),
];

pub(crate) static EXPRESSIONS: &[OperatorSpec] = &[
    common("$cond", "If-then-else"),
    common("$ifNull", "First non-null value"),
    common("$concat", "Concatenate strings"),
    common("$add", "Addition"),
    common("$subtract", "Subtraction"),
    common("$multiply", "Multiplication"),
    common("$divide", "Division"),
    op("$mod", "Remainder"),
    op("$round", "Round a number"),
    op("$eq", "Equal"),
    op("$ne", "Not equal"),
    op("$gt", "Greater than"),
    op("$gte", "Greater than or equal"),
    op("$lt", "Less than"),
    op("$lte", "Less than or equal"),
    op("$and", "Logical and"),
    op("$or", "Logical or"),
    op("$not", "Logical not"),
    op("$in", "Value in array"),
    op("$switch", "Multi-branch conditional"),
    op("$toUpper", "Uppercase string"),
    op("$toLower", "Lowercase string"),
    op("$substrCP", "Substring by code point"),
    op("$split", "Split a string"),
    op("$trim", "Trim whitespace"),
    op("$size", "Array length"),
    op("$arrayElemAt", "Element at index"),
    op("$filter", "Filter an array"),
    op("$map", "Transform an array"),
    op("$reduce", "Fold an array"),
    op("$dateToString", "Format a date"),
    op("$year", "Year of a date"),
    op("$month", "Month of a date"),
    op("$dayOfMonth", "Day of the month"),
    op("$toString", "Convert to string"),
    op("$toInt", "Convert to integer"),
    op("$toDate", "Convert to date"),
    op("$literal", "Unparsed value"),
];

pub(crate) static SYSTEM_VARIABLES: &[(&str, &str)] = &[
    ("$$ROOT", "The top-level document"),
    ("$$CURRENT", "The current document"),
    ("$$NOW", "Current datetime"),
    ("$$REMOVE", "Removes the field"),
    ("$$DESCEND", "$redact: descend into fields"),
    ("$$PRUNE", "$redact: exclude fields"),
    ("$$KEEP", "$redact: keep fields"),
    ("$$CLUSTER_TIME", "Current cluster timestamp"),
];

/// Top-level keys of a command document.
pub(crate) static ROOT_PROPERTIES: &[(&str, &str)] = &[
    ("find", "Query a collection"),
    ("aggregate", "Run an aggregation pipeline"),
    ("count", "Count matching documents"),
    ("distinct", "Distinct values of a field"),
    ("update", "Update documents"),
    ("delete", "Delete documents"),
    ("filter", "Query filter"),
    ("projection", "Fields to return"),
    ("sort", "Sort order"),
    ("limit", "Maximum number of documents"),
    ("skip", "Documents to skip"),
    ("pipeline", "Aggregation stages"),
    ("key", "Field for distinct"),
    ("query", "Query filter"),
    ("updates", "Update statements"),
    ("deletes", "Delete statements"),
    ("hint", "Index to use"),
    ("collation", "String comparison rules"),
    ("allowDiskUse", "Allow temporary files"),
    ("explain", "Return the query plan"),
];

/// Keys accepted inside stage bodies that take options rather than expressions.
pub(crate) static STAGE_OPTIONS: &[(&str, &[&str])] = &[
    ("$lookup", &["from", "localField", "foreignField", "as", "let", "pipeline"]),
    ("$unwind", &["path", "includeArrayIndex", "preserveNullAndEmptyArrays"]),
    ("$bucket", &["groupBy", "boundaries", "default", "output"]),
    ("$bucketAuto", &["groupBy", "buckets", "output", "granularity"]),
    ("$out", &["db", "coll"]),
    ("$merge", &["into", "on", "let", "whenMatched", "whenNotMatched"]),
    ("$sample", &["size"]),
    ("$graphLookup", &["from", "startWith", "connectFromField", "connectToField", "as", "maxDepth", "depthField"]),
    ("$unionWith", &["coll", "pipeline"]),
    ("$replaceRoot", &["newRoot"]),
    ("$geoNear", &["near", "distanceField", "spherical", "query", "maxDistance"]),
    ("$setWindowFields", &["partitionBy", "sortBy", "output"]),
];

/// Keys whose value is a collection name.
pub(crate) static COLLECTION_KEYS: &[&str] = &[
    "find",
    "aggregate",
    "count",
    "distinct",
    "update",
    "delete",
    "collection",
    "from",
    "coll",
    "into",
    "$out",
];

/// Options that take a boolean.
pub(crate) static BOOLEAN_KEYS: &[&str] = &[
    "allowDiskUse",
    "explain",
    "upsert",
    "multi",
    "ordered",
    "preserveNullAndEmptyArrays",
    "bypassDocumentValidation",
    "spherical",
    "new",
];

#[derive(Debug, Clone, Copy)]
pub(crate) struct MongoSnippet {
    pub label: &'static str,
    pub template: &'static str,
    pub description: &'static str,
}

pub(crate) static ROOT_SNIPPETS: &[MongoSnippet] = &[
    MongoSnippet {
        label: "find-filter",
        template: r#""find": "collection", "filter": {}"#,
        description: "Find documents",
    },
    MongoSnippet {
        label: "aggregate-pipeline",
        template: r#""aggregate": "collection", "pipeline": []"#,
        description: "Aggregation pipeline",
    },
    MongoSnippet {
        label: "count-query",
        template: r#""count": "collection", "query": {}"#,
        description: "Count documents",
    },
    MongoSnippet {
        label: "distinct-key",
        template: r#""distinct": "collection", "key": "field""#,
        description: "Distinct values",
    },
];

pub(crate) static PIPELINE_SNIPPETS: &[MongoSnippet] = &[
    MongoSnippet {
        label: "group-count",
        template: r#"{"$group": {"_id": "$field", "count": {"$sum": 1}}}"#,
        description: "Count documents per key",
    },
    MongoSnippet {
        label: "lookup-unwind",
        template: r#"{"$lookup": {"from": "collection", "localField": "field", "foreignField": "_id", "as": "joined"}}, {"$unwind": "$joined"}"#,
        description: "Join and flatten",
    },
    MongoSnippet {
        label: "sort-limit",
        template: r#"{"$sort": {"field": -1}}, {"$limit": 10}"#,
        description: "Top documents",
    },
];

pub(crate) fn stage_options(stage: &str) -> &'static [&'static str] {
    STAGE_OPTIONS
        .iter()
        .find(|(name, _)| *name == stage)
        .map(|(_, options)| *options)
        .unwrap_or(&[])
}

pub(crate) fn is_update_operator(key: &str) -> bool {
    UPDATE_OPERATORS.iter().any(|spec| spec.name == key)
}
