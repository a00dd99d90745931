/// One benchmarked exchange: a body written by a handler in fixed size pieces.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    body: TestBody,
    write_size: usize,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, body: TestBody, write_size: usize) -> Self {
        Self { name, group, body, write_size }
    }

    /// The whole body in a single write.
    pub fn buffered(name: &'static str, body: TestBody) -> Self {
        Self::new(name, TestGroup::Buffered, body, body.len())
    }

    /// The body in pieces of `write_size`, large enough to overflow the response buffer.
    pub fn streamed(name: &'static str, body: TestBody, write_size: usize) -> Self {
        Self::new(name, TestGroup::Streamed, body, write_size)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn body(&self) -> &TestBody {
        &self.body
    }

    pub fn write_size(&self) -> usize {
        self.write_size
    }

    pub fn pieces(&self) -> impl Iterator<Item = &'static [u8]> {
        self.body.content().chunks(self.write_size.max(1))
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestBody {
    content: &'static [u8],
}

impl TestBody {
    pub const fn new(content: &'static [u8]) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &'static [u8] {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Buffered,
    Streamed,
}
