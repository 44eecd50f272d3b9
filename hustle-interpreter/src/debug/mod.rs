//! Debugging facilities.

/// Stack dumps and backtraces.
pub mod dump;

use crate::error::VmError;
use crate::vm::Vm;
use log::warn;

/// When the step hook should break next.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StepMode {
    #[default]
    None,
    /// Before the very next instruction.
    Step,
    /// Before the next instruction run with the call stack at this position.
    Over { call_stack_sp: usize },
}

/// What a debug listener wants the interpreter to do once it returns.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DebugCommand {
    Continue,
    Step,
    Over,
}

/// Called synchronously whenever the interpreter breaks.
pub type DebugListener = Box<dyn FnMut(&mut Vm) -> DebugCommand>;

#[derive(Default)]
pub struct DebugState {
    mode: StepMode,
    listener: Option<DebugListener>,
}

impl Vm {
    /// Installs `listener`, returning the one it replaces.
    pub fn set_debug_listener(&mut self, listener: Option<DebugListener>) -> Option<DebugListener> {
        std::mem::replace(&mut self.debug.listener, listener)
    }

    pub fn step_mode(&self) -> StepMode {
        self.debug.mode
    }

    pub fn set_step_mode(&mut self, mode: StepMode) {
        self.debug.mode = mode;
    }

    /// Runs before every interpreted instruction; `offset` is the instruction about to run.
    pub(crate) fn step_hook(&mut self, offset: usize) -> Result<(), VmError> {
        let should_break = match self.debug.mode {
            StepMode::None => false,
            StepMode::Step => true,
            StepMode::Over { call_stack_sp } => self.call_stack.sp() == call_stack_sp,
        };
        if !should_break {
            return Ok(());
        }
        self.debug.mode = StepMode::None;
        // make the paused position visible to the listener
        self.call_stack.update_offset(offset)?;
        self.interpreter_break();
        Ok(())
    }

    /// Disarms stepping over a frame that is no longer on the call stack.
    pub(crate) fn drop_stale_step(&mut self) {
        if let StepMode::Over { call_stack_sp } = self.debug.mode {
            // frames grow downward, so a smaller position lies above the current top
            if call_stack_sp < self.call_stack.sp() {
                self.debug.mode = StepMode::None;
            }
        }
    }

    /// Hands control to the debug listener and arms stepping according to its answer.
    pub fn interpreter_break(&mut self) {
        let Some(mut listener) = self.debug.listener.take() else {
            warn!("break requested without a debug listener");
            return;
        };
        let command = listener(self);
        // the listener may have installed a replacement for itself
        if self.debug.listener.is_none() {
            self.debug.listener = Some(listener);
        }
        self.debug.mode = match command {
            DebugCommand::Continue => StepMode::None,
            DebugCommand::Step => StepMode::Step,
            DebugCommand::Over => StepMode::Over {
                call_stack_sp: self.call_stack.sp(),
            },
        };
    }
}
