use crate::call_stack::StackFrame;
use crate::error::VmError;
use crate::vm::Vm;
use hustle_value::{Cell, ObjectTag, Quotation, Word, Wrapper};
use log::trace;

impl Vm {
    /// Pushes literals, calls words and wrappers.
    pub fn evaluate(&mut self, cell: Cell) -> Result<(), VmError> {
        match cell.tag() {
            Some(ObjectTag::Word | ObjectTag::Wrapper) => self.call(cell),
            _ => self.push(cell),
        }
    }

    /// Runs a word, quotation or wrapper to completion.
    ///
    /// On error the call stack is rewound to where it was on entry. The data stack is left as
    /// the failing code left it.
    pub fn call(&mut self, cell: Cell) -> Result<(), VmError> {
        let entry_state = self.call_stack.state();
        let result = self.enter(cell);
        if result.is_err() {
            self.call_stack.restore_state(entry_state);
        }
        self.drop_stale_step();
        result
    }

    fn enter(&mut self, cell: Cell) -> Result<(), VmError> {
        if cell.is_int() || cell.is_null() {
            return Err(VmError::NotCallable(if cell.is_int() { "int" } else { "null" }));
        }
        self.call_stack.push(StackFrame::entry())?;

        let frame = match cell.tag() {
            Some(ObjectTag::Wrapper) => {
                let wrapped = cell.cast::<Wrapper>().wrapped;
                self.push(wrapped)?;
                self.call_stack.pop()?;
                return Ok(());
            }
            Some(ObjectTag::Word) => word_frame(cell)?,
            Some(ObjectTag::Quote) => StackFrame::for_quotation(cell.cast::<Quotation>()),
            _ => return Err(VmError::NotCallable(cell.kind_name())),
        };
        self.call_stack.push(frame)?;
        self.interpreter_loop()
    }

    /// The instruction at `offset` in the top frame's quotation, if there is one.
    fn instruction_at(&self, offset: usize) -> Result<Option<Cell>, VmError> {
        let definition = self.call_stack.peek()?.quote.get().definition;
        if definition.is_null() {
            return Ok(None);
        }
        let definition = definition.get();
        Ok((offset < definition.len()).then(|| definition.get(offset)))
    }

    /// Runs frames until the entry frame pushed by [`Vm::call`] is reached.
    ///
    /// Word calls push a frame and restart from the top instead of recursing, so the depth of
    /// program recursion is bounded by the call stack, not the native one.
    fn interpreter_loop(&mut self) -> Result<(), VmError> {
        'frames: loop {
            let frame = self.call_stack.peek()?;
            if frame.is_entry() {
                self.call_stack.pop()?;
                return Ok(());
            }

            if let Some(primitive) = frame.quote.get().entry() {
                trace!("primitive {}", self.primitive_name(primitive).unwrap_or("?"));
                let function = self.primitive(primitive);
                function(self)?;
                self.call_stack.pop()?;
                continue;
            }

            let mut offset = frame.offset;
            while self.instruction_at(offset)?.is_some() {
                self.step_hook(offset)?;
                // the hook may have run arbitrary code, so the quotation is looked up again
                let Some(instruction) = self.instruction_at(offset)? else {
                    break;
                };
                offset += 1;

                match instruction.tag() {
                    Some(ObjectTag::Word) => {
                        let callee = word_frame(instruction)?;
                        self.call_stack.update_offset(offset)?;
                        self.call_stack.push(callee)?;
                        continue 'frames;
                    }
                    Some(ObjectTag::Wrapper) if !instruction.is_null() => {
                        self.push(instruction.cast::<Wrapper>().wrapped)?;
                    }
                    _ => self.push(instruction)?,
                }
            }
            self.call_stack.pop()?;
        }
    }
}

/// The frame running a word's definition.
pub(crate) fn word_frame(cell: Cell) -> Result<StackFrame, VmError> {
    let word = cell.cast::<Word>();
    if word.is_null() {
        return Err(VmError::NotCallable("null"));
    }
    StackFrame::for_word(word).ok_or(VmError::NotCallable("word without definition"))
}
