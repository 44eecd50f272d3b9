use crate::error::VmError;
use crate::stack::Stack;
use hustle_value::{Cell, Gc, Quotation, TypedCell, Word};

/// Number of cells a frame occupies on the call stack.
pub const FRAME_CELLS: usize = 3;

/// One activation: the word being run (if any), its quotation and where to resume in it.
///
/// A frame with a null quotation marks the point where a native caller entered the interpreter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StackFrame {
    pub word: TypedCell<Word>,
    pub quote: TypedCell<Quotation>,
    pub offset: usize,
}

impl StackFrame {
    pub fn entry() -> Self {
        StackFrame {
            word: TypedCell::null(),
            quote: TypedCell::null(),
            offset: 0,
        }
    }

    pub fn for_quotation(quote: Gc<Quotation>) -> Self {
        StackFrame {
            word: TypedCell::null(),
            quote: TypedCell::new(quote),
            offset: 0,
        }
    }

    /// A frame running `word`'s definition. `None` if the word has no definition.
    pub fn for_word(word: Gc<Word>) -> Option<Self> {
        (!word.definition.is_null()).then(|| StackFrame {
            word: TypedCell::new(word),
            quote: word.definition,
            offset: 0,
        })
    }

    pub fn is_entry(&self) -> bool {
        self.quote.is_null()
    }
}

/// Saved position of a [`CallStack`], see [`CallStack::state`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallStackState {
    sp: usize,
}

/// A [`Stack`] holding frames, three cells each: offset, quotation, then word on top.
pub struct CallStack {
    stack: Stack,
}

impl CallStack {
    pub fn new(max_frames: usize) -> Self {
        CallStack {
            stack: Stack::new(max_frames * FRAME_CELLS),
        }
    }

    pub fn push(&mut self, frame: StackFrame) -> Result<(), VmError> {
        if self.stack.sp() < FRAME_CELLS {
            return Err(VmError::StackOverflow);
        }
        self.stack.push(Cell::from_int(frame.offset as isize))?;
        self.stack.push(frame.quote.cell())?;
        self.stack.push(frame.word.cell())
    }

    pub fn pop(&mut self) -> Result<StackFrame, VmError> {
        let frame = self.peek()?;
        for _ in 0..FRAME_CELLS {
            self.stack.pop()?;
        }
        Ok(frame)
    }

    pub fn peek(&self) -> Result<StackFrame, VmError> {
        match self.is_empty() {
            true => Err(VmError::StackUnderflow),
            false => self.frame(0),
        }
    }

    /// The frame `index` frames below the top.
    pub fn frame(&self, index: usize) -> Result<StackFrame, VmError> {
        let base = index * FRAME_CELLS;
        Ok(StackFrame {
            word: TypedCell::from_cell(self.stack.get(base)?),
            quote: TypedCell::from_cell(self.stack.get(base + 1)?),
            offset: self.stack.get(base + 2)?.get_int() as usize,
        })
    }

    /// Persists the resume point of the top frame.
    pub fn update_offset(&mut self, offset: usize) -> Result<(), VmError> {
        let mut frame = self.pop()?;
        frame.offset = offset;
        self.push(frame)
    }

    /// Number of frames.
    pub fn depth(&self) -> usize {
        self.stack.depth() / FRAME_CELLS
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Raw position of the top frame. Equal positions mean the same frame depth.
    pub fn sp(&self) -> usize {
        self.stack.sp()
    }

    pub fn state(&self) -> CallStackState {
        CallStackState { sp: self.stack.sp() }
    }

    /// Drops every frame pushed since `state` was taken.
    pub fn restore_state(&mut self, state: CallStackState) {
        self.stack.unwind_to(state.sp);
    }

    /// Frames, top first.
    pub fn frames(&self) -> impl Iterator<Item = StackFrame> + '_ {
        (0..self.depth()).filter_map(move |index| self.frame(index).ok())
    }

    /// Visits the word and quotation of every frame.
    pub fn mark_frames(&mut self, visit: &mut dyn FnMut(&mut Cell)) {
        for frame in self.stack.as_mut_slice().chunks_exact_mut(FRAME_CELLS) {
            visit(&mut frame[0]);
            visit(&mut frame[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_round_trip_in_order() {
        let mut call_stack = CallStack::new(4);
        let mut frame = StackFrame::entry();
        frame.offset = 7;
        call_stack.push(StackFrame::entry()).unwrap();
        call_stack.push(frame).unwrap();

        assert_eq!(call_stack.depth(), 2);
        assert_eq!(call_stack.peek(), Ok(frame));
        assert_eq!(call_stack.frame(1), Ok(StackFrame::entry()));
        assert_eq!(call_stack.pop(), Ok(frame));
        assert_eq!(call_stack.pop(), Ok(StackFrame::entry()));
        assert_eq!(call_stack.pop(), Err(VmError::StackUnderflow));
    }

    #[test]
    fn update_offset_rewrites_top_frame() {
        let mut call_stack = CallStack::new(2);
        call_stack.push(StackFrame::entry()).unwrap();
        call_stack.update_offset(3).unwrap();
        assert_eq!(call_stack.peek().unwrap().offset, 3);
        assert_eq!(call_stack.depth(), 1);
    }

    #[test]
    fn overflow_leaves_no_partial_frame() {
        let mut call_stack = CallStack::new(1);
        call_stack.push(StackFrame::entry()).unwrap();
        assert_eq!(call_stack.push(StackFrame::entry()), Err(VmError::StackOverflow));
        assert_eq!(call_stack.depth(), 1);
    }

    #[test]
    fn restore_state_discards_newer_frames() {
        let mut call_stack = CallStack::new(4);
        call_stack.push(StackFrame::entry()).unwrap();
        let state = call_stack.state();
        call_stack.push(StackFrame::entry()).unwrap();
        call_stack.push(StackFrame::entry()).unwrap();

        call_stack.restore_state(state);
        assert_eq!(call_stack.depth(), 1);
        assert_eq!(call_stack.state(), state);
    }

    #[test]
    fn marking_skips_offsets() {
        let mut call_stack = CallStack::new(2);
        call_stack.push(StackFrame::entry()).unwrap();
        let mut visited = Vec::new();
        call_stack.mark_frames(&mut |cell| visited.push(*cell));
        assert_eq!(visited, vec![Cell::null::<Word>(), Cell::null::<Quotation>()]);
    }
}
