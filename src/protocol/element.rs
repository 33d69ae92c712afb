// ELEMENT STREAM COMPONENT ----------------------------------------------------

/// Wire tag for end-of-message.
pub const TAG_END: u8 = 0;
/// Wire tag for a keyword/command code.
pub const TAG_KEY: u8 = 3;
/// Wire tag for a signed 32-bit number.
pub const TAG_NUM: u8 = 4;
/// Wire tag for a string.
pub const TAG_STR: u8 = 5;

/// One decoded protocol element. The transport layer hands the engine an
/// already-tokenized, flat sequence of these; raw byte framing never reaches
/// this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    End,
    Key(i32),
    Num(i32),
    Str(String),
}

/// Cursor over a tokenized message.
///
/// Each accessor consumes exactly one element if and only if its tag matches;
/// otherwise it returns `None` and leaves the cursor unmoved so the caller
/// can try a different accessor. Parse loops must terminate on `at_end`.
/// Malformed streams are never an error - decoding is best-effort and the
/// remainder of a bad message is simply unreachable.
pub struct ElementStream {
    elements: Vec<Element>,
    cursor: usize,
}

impl ElementStream {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            cursor: 0,
        }
    }

    fn peek(&self) -> Option<&Element> {
        self.elements.get(self.cursor)
    }

    /// True at stream exhaustion or on an `End` element, without consuming it.
    pub fn at_end(&self) -> bool {
        matches!(self.peek(), None | Some(Element::End))
    }

    pub fn next_key(&mut self) -> Option<i32> {
        if let Some(Element::Key(k)) = self.peek() {
            let k = *k;
            self.cursor += 1;
            return Some(k);
        }
        None
    }

    pub fn next_num(&mut self) -> Option<i32> {
        if let Some(Element::Num(n)) = self.peek() {
            let n = *n;
            self.cursor += 1;
            return Some(n);
        }
        None
    }

    pub fn next_str(&mut self) -> Option<&str> {
        if matches!(self.peek(), Some(Element::Str(_))) {
            self.cursor += 1;
            if let Element::Str(s) = &self.elements[self.cursor - 1] {
                return Some(s);
            }
        }
        None
    }

    /// Advance past one element of any tag except `End`. Used to step over
    /// arguments of unrecognized keywords so the protocol stays
    /// forward-compatible.
    pub fn skip(&mut self) {
        if !self.at_end() {
            self.cursor += 1;
        }
    }
}
