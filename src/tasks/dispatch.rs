// Wand — Dispatch Task
//
// Single consumer of every event that can touch engine state: dispatch ticks,
// BLE stack notifications and the external wake line.  Each event runs to
// completion before the next one is looked at.

use crate::engine::GestureEngine;
use crate::error::WandResult;
use crate::events::WandEvent;
use crate::hal::{AxisSource, BleStack, Board, PowerControl};

pub struct Dispatcher<S, B, P> {
    engine: GestureEngine,
    board: Board<S, B, P>,
}

impl<S, B, P> Dispatcher<S, B, P>
where
    S: AxisSource,
    B: BleStack,
    P: PowerControl,
{
    pub fn new(board: Board<S, B, P>) -> Self {
        Self {
            engine: GestureEngine::new(),
            board,
        }
    }

    pub fn start(&mut self) -> WandResult<()> {
        self.engine.start(&mut self.board)
    }

    pub fn handle(&mut self, event: WandEvent) -> WandResult<()> {
        match event {
            WandEvent::Tick => self.tick(),
            WandEvent::Ble(ble) => self.engine.on_ble_event(ble, &mut self.board),
            WandEvent::Wake => self.engine.wake(&mut self.board),
        }
    }

    fn tick(&mut self) -> WandResult<()> {
        self.board.timers.advance();
        while let Some((handle, event)) = self.board.timers.pop_due() {
            self.engine.on_timer(handle, event, &mut self.board)?;
        }
        Ok(())
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    pub fn board(&self) -> &Board<S, B, P> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board<S, B, P> {
        &mut self.board
    }
}
