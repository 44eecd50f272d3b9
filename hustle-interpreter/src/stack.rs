use crate::error::VmError;
use hustle_value::Cell;

/// A fixed-capacity stack of cells.
///
/// Grows towards index 0: a push decrements `sp`, a pop increments it. Indexing starts at the
/// most recently pushed cell.
pub struct Stack {
    slots: Box<[Cell]>,
    /// Index of the top cell; equal to the capacity when empty.
    sp: usize,
}

impl Stack {
    pub fn new(capacity: usize) -> Self {
        Stack {
            slots: vec![Cell::default(); capacity].into_boxed_slice(),
            sp: capacity,
        }
    }

    pub fn push(&mut self, cell: Cell) -> Result<(), VmError> {
        if self.sp == 0 {
            return Err(VmError::StackOverflow);
        }
        self.sp -= 1;
        self.slots[self.sp] = cell;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Cell, VmError> {
        let cell = self.peek()?;
        self.slots[self.sp] = Cell::default();
        self.sp += 1;
        Ok(cell)
    }

    pub fn peek(&self) -> Result<Cell, VmError> {
        match self.is_empty() {
            true => Err(VmError::StackUnderflow),
            false => Ok(self.slots[self.sp]),
        }
    }

    /// The cell `index` slots below the top.
    pub fn get(&self, index: usize) -> Result<Cell, VmError> {
        self.check_index(index)?;
        Ok(self.slots[self.sp + index])
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Cell, VmError> {
        self.check_index(index)?;
        Ok(&mut self.slots[self.sp + index])
    }

    fn check_index(&self, index: usize) -> Result<(), VmError> {
        match index < self.depth() {
            true => Ok(()),
            false => Err(VmError::StackIndexOutOfRange {
                index,
                depth: self.depth(),
            }),
        }
    }

    pub fn depth(&self) -> usize {
        self.slots.len() - self.sp
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sp == self.slots.len()
    }

    /// Raw position of the top of the stack. Smaller means deeper.
    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Drops everything above `sp`, which must not be above the current top.
    pub fn unwind_to(&mut self, sp: usize) {
        assert!(sp >= self.sp && sp <= self.slots.len(), "cannot unwind from {} to {}", self.sp, sp);
        self.slots[self.sp..sp].fill(Cell::default());
        self.sp = sp;
    }

    pub fn clear(&mut self) {
        self.unwind_to(self.slots.len());
    }

    /// Live cells, top first.
    pub fn as_slice(&self) -> &[Cell] {
        &self.slots[self.sp..]
    }

    pub fn as_mut_slice(&mut self) -> &mut [Cell] {
        &mut self.slots[self.sp..]
    }

    /// Live cells, top first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Cell> {
        self.as_slice().iter()
    }
}
