use mentrot_core::stimulus::TrialSpec;

/// Ordered walk over one block's trial specs. Every spec runs exactly once,
/// sequentially; results are tagged with the block name and a 1-based index.
#[derive(Debug)]
pub struct BlockRun {
    name: &'static str,
    specs: Vec<TrialSpec>,
    cursor: usize,
}

impl BlockRun {
    pub fn new(name: &'static str, specs: Vec<TrialSpec>) -> Self {
        Self {
            name,
            specs,
            cursor: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Next spec with its 1-based trial index, or `None` once exhausted.
    pub fn next_spec(&mut self) -> Option<(usize, TrialSpec)> {
        let spec = self.specs.get(self.cursor)?.clone();
        self.cursor += 1;
        Some((self.cursor, spec))
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.specs.len()
    }
}
