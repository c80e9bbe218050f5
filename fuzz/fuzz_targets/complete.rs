#![no_main]

use libfuzzer_sys::fuzz_target;
use querysense_core::{
    complete_mongo, complete_sql, Dialect, MongoCompletionRequest, SqlCompletionRequest,
};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };

    // Every char boundary is a valid cursor.
    let mut cursor = (selector as usize * 7) % (text.len() + 1);
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }

    let dialect = Dialect::ALL[selector as usize % Dialect::ALL.len()];
    let sql = complete_sql(&SqlCompletionRequest::new(text, cursor).with_dialect(dialect));
    assert!(sql.error.is_none());
    assert!(sql.insert_from <= cursor);

    let mongo = complete_mongo(&MongoCompletionRequest::new(text, cursor));
    assert!(mongo.error.is_none());
    assert!(mongo.insert_from <= cursor);
});
