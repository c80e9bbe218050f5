//! Character fold over a MongoDB command document.
//!
//! [`MongoScan::step`] consumes one character and returns the next state, so
//! the state after any prefix of the text is the same no matter how much text
//! follows. Keys may be quoted (`"find"`, `'find'`) or bare (`find`).

/// Keys whose string value names the target collection.
pub(crate) const COLLECTION_COMMANDS: &[&str] = &[
    "find",
    "aggregate",
    "count",
    "distinct",
    "update",
    "delete",
    "collection",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    /// An open `{`. `key` is the most recent key completed in it.
    Object { key: Option<String> },
    /// An open `[`. `owner` is the key whose value the array is.
    Array { owner: Option<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OpenString {
    quote: char,
    escaped: bool,
    /// Raw text since the opening quote, escapes included.
    text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MongoScan {
    pub frames: Vec<Frame>,
    string: Option<OpenString>,
    /// Last completed string or bare token since the previous separator.
    pending: Option<String>,
    bare: String,
    pub after_colon: bool,
    /// A whole value was read in the current value position; only a
    /// separator or closing bracket can follow.
    pub value_complete: bool,
    pub collection: Option<String>,
}

impl MongoScan {
    pub(crate) fn scan(text: &str) -> Self {
        text.chars().fold(Self::default(), Self::step)
    }

    pub(crate) fn step(mut self, ch: char) -> Self {
        if let Some(open) = self.string.as_mut() {
            if open.escaped {
                open.escaped = false;
            } else if ch == '\\' {
                open.escaped = true;
            } else if ch == open.quote {
                if let Some(closed) = self.string.take() {
                    self.close_string(closed.text);
                }
                return self;
            }
            open.text.push(ch);
            return self;
        }

        match ch {
            '"' | '\'' => {
                self.end_bare();
                self.string = Some(OpenString {
                    quote: ch,
                    ..OpenString::default()
                });
            }
            '{' => {
                self.end_bare();
                self.frames.push(Frame::Object { key: None });
                self.reset();
            }
            '[' => {
                let owner = self.value_key();
                self.frames.push(Frame::Array { owner });
                self.reset();
            }
            '}' | ']' => {
                self.frames.pop();
                self.reset();
            }
            ',' => {
                self.end_bare();
                self.reset();
            }
            ':' => {
                self.end_bare();
                let key = self.pending.take();
                if let Some(Frame::Object { key: slot }) = self.frames.last_mut() {
                    *slot = key;
                }
                self.after_colon = true;
            }
            ch if ch.is_whitespace() => self.end_bare(),
            ch => self.bare.push(ch),
        }
        self
    }

    pub(crate) fn in_string(&self) -> bool {
        self.string.is_some()
    }

    /// The partial string or bare token at the end of the scanned text.
    pub(crate) fn current_word(&self) -> &str {
        match &self.string {
            Some(open) => &open.text,
            None => &self.bare,
        }
    }

    /// Key of the innermost object when the scan sits in its value position.
    pub(crate) fn value_key(&self) -> Option<String> {
        match self.frames.last() {
            Some(Frame::Object { key }) if self.after_colon => key.clone(),
            _ => None,
        }
    }

    fn close_string(&mut self, text: String) {
        let root_value = self.after_colon && self.frames.len() == 1;
        if root_value
            && self
                .value_key()
                .is_some_and(|key| COLLECTION_COMMANDS.contains(&key.as_str()))
        {
            self.collection = Some(text.clone());
        }
        if self.in_value_position() {
            self.value_complete = true;
        }
        self.pending = Some(text);
    }

    fn end_bare(&mut self) {
        if !self.bare.is_empty() {
            if self.in_value_position() {
                self.value_complete = true;
            }
            self.pending = Some(std::mem::take(&mut self.bare));
        }
    }

    fn in_value_position(&self) -> bool {
        self.after_colon || matches!(self.frames.last(), Some(Frame::Array { .. }))
    }

    fn reset(&mut self) {
        self.pending = None;
        self.bare.clear();
        self.after_colon = false;
        self.value_complete = false;
    }
}
