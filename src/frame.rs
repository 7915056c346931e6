use std::rc::Rc;

use crate::value::CompiledFunction;

/// Call frame for the bytecode backend: the running function, its
/// instruction pointer, and where its locals start on the value stack.
#[derive(Debug, Clone)]
pub struct Frame {
    function: Rc<CompiledFunction>,
    /// Index of the last executed instruction; `-1` before the first fetch.
    pub ip: isize,
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(function: Rc<CompiledFunction>, base_pointer: usize) -> Self {
        Frame {
            function,
            ip: -1,
            base_pointer,
        }
    }

    pub fn function(&self) -> &Rc<CompiledFunction> {
        &self.function
    }

    pub fn instructions(&self) -> &[u8] {
        &self.function.instructions
    }
}
