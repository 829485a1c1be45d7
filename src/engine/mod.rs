// Wand — Gesture & Advertising Engine
//
// Single owned state for the whole application.  Every operation takes the
// `Board` by `&mut`, so all mutation funnels through whoever owns the engine
// (the dispatch task); nothing here is reentrant or shared.

pub mod advertising;
pub mod classifier;
pub mod lifecycle;
pub mod payload;
pub mod sampler;

use crate::config::{
    ADV_DATA_UPDATE_TICKS, GESTURE_DISPLAY_RESET_TICKS, GESTURE_LOCKOUT_TICKS, MOTOR_ON_TICKS,
    PARAM_UPDATE_REQUEST_TICKS, PREFERRED_CONNECTION,
};
use crate::error::WandResult;
use crate::events::{
    AdvertiseStatus, Axis, BleEvent, ConnectionId, ConnectionParams, GestureCode, RawSample,
    TimerEvent,
};
use crate::hal::{AxisSource, BleStack, Board, PowerControl};
use crate::timer::{TimerHandle, TimerQueue};

use advertising::AdvertisingPublisher;
use classifier::GestureClassifier;
use lifecycle::{PowerLifecycle, PowerState};
use payload::{GesturePayload, ManufacturerData};
use sampler::AxisSampler;

/// Outstanding one-shot timers; `None` means no timer of that kind is live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerSlots {
    pub adv_data_update: Option<TimerHandle>,
    pub param_update_request: Option<TimerHandle>,
    pub gesture_lockout: Option<TimerHandle>,
    pub gesture_display_reset: Option<TimerHandle>,
    pub motor_on: Option<TimerHandle>,
}

impl TimerSlots {
    fn slot_mut(&mut self, event: TimerEvent) -> &mut Option<TimerHandle> {
        match event {
            TimerEvent::AdvDataUpdate => &mut self.adv_data_update,
            TimerEvent::ParamUpdateRequest => &mut self.param_update_request,
            TimerEvent::GestureLockout => &mut self.gesture_lockout,
            TimerEvent::GestureDisplayReset => &mut self.gesture_display_reset,
            TimerEvent::MotorOn => &mut self.motor_on,
        }
    }

    /// Replace any live timer of this kind with a fresh one.
    fn restart(&mut self, timers: &mut TimerQueue, delay: u32, event: TimerEvent) -> WandResult<()> {
        self.cancel(timers, event);
        *self.slot_mut(event) = Some(timers.schedule(delay, event)?);
        Ok(())
    }

    fn cancel(&mut self, timers: &mut TimerQueue, event: TimerEvent) {
        if let Some(handle) = self.slot_mut(event).take() {
            timers.cancel(handle);
        }
    }

    /// Forget a handle that just fired.  A mismatch means the timer was
    /// replaced in the meantime and the slot already holds the newer one.
    fn fired(&mut self, handle: TimerHandle, event: TimerEvent) -> bool {
        let slot = self.slot_mut(event);
        if *slot == Some(handle) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

/// State that has to survive the sleep/wake cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedState {
    pub mnf_data: ManufacturerData,
    pub publisher: AdvertisingPublisher,
    pub timers: TimerSlots,
    pub connection: Option<ConnectionId>,
}

impl RetainedState {
    pub fn new() -> Self {
        Self {
            mnf_data: ManufacturerData::new(),
            publisher: AdvertisingPublisher::new(),
            timers: TimerSlots::default(),
            connection: None,
        }
    }
}

impl Default for RetainedState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct GestureEngine {
    retained: RetainedState,
    // Reinitialized on every wake.
    sampler: AxisSampler,
    classifier: GestureClassifier,
    lifecycle: PowerLifecycle,
    advertising: bool,
}

impl GestureEngine {
    pub fn new() -> Self {
        Self {
            retained: RetainedState::new(),
            sampler: AxisSampler::new(),
            classifier: GestureClassifier::new(),
            lifecycle: PowerLifecycle::new(),
            advertising: false,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn payload(&self) -> &GesturePayload {
        &self.retained.mnf_data.payload
    }

    pub fn retained(&self) -> &RetainedState {
        &self.retained
    }

    pub fn publisher(&self) -> &AdvertisingPublisher {
        &self.retained.publisher
    }

    pub fn sampler(&self) -> &AxisSampler {
        &self.sampler
    }

    pub fn power_state(&self) -> PowerState {
        self.lifecycle.state()
    }

    pub fn is_locked_out(&self) -> bool {
        self.classifier.is_locked_out()
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    // -----------------------------------------------------------------------
    // Boot & advertising
    // -----------------------------------------------------------------------

    /// Bring up the sensor and start advertising with the gesture payload.
    pub fn start<S, B, P>(&mut self, board: &mut Board<S, B, P>) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        log::info!("Wand engine starting");
        if let Err(e) = board.sensor.init() {
            log::warn!("Accelerometer init failed: {:?}", e);
        }
        self.start_advertising(board)
    }

    fn start_advertising<S, B, P>(&mut self, board: &mut Board<S, B, P>) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        self.retained.timers.restart(
            &mut board.timers,
            ADV_DATA_UPDATE_TICKS,
            TimerEvent::AdvDataUpdate,
        )?;

        let mut cmd = board.ble.active_advertise_command();
        self.retained.publisher.install(&mut cmd, &self.retained.mnf_data)?;
        board.ble.start_undirected_advertising(&cmd);
        self.advertising = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Timer callbacks
    // -----------------------------------------------------------------------

    pub fn on_timer<S, B, P>(
        &mut self,
        handle: TimerHandle,
        event: TimerEvent,
        board: &mut Board<S, B, P>,
    ) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        if !self.retained.timers.fired(handle, event) {
            log::debug!("Ignoring superseded {:?} timer", event);
            return Ok(());
        }
        match event {
            TimerEvent::AdvDataUpdate => self.publish_tick(board),
            TimerEvent::GestureLockout => {
                self.classifier.unlock();
                Ok(())
            }
            TimerEvent::GestureDisplayReset => self.display_reset(board),
            TimerEvent::MotorOn => self.motor_done(board),
            TimerEvent::ParamUpdateRequest => {
                if let Some(conidx) = self.retained.connection {
                    board.ble.start_connection_param_update(conidx);
                }
                Ok(())
            }
        }
    }

    /// Sample → classify → encode, then push the refreshed payload live.
    fn publish_tick<S, B, P>(&mut self, board: &mut Board<S, B, P>) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        if !self.retained.publisher.continue_updating() {
            return Ok(());
        }

        self.update_gesture_data(board)?;

        let publisher = &mut self.retained.publisher;
        publisher.splice(&self.retained.mnf_data);
        let stored = publisher.stored();
        board
            .ble
            .update_live_advertising_data(&stored.adv_data, &stored.scan_rsp_data);

        if publisher.continue_updating() {
            self.retained.timers.restart(
                &mut board.timers,
                ADV_DATA_UPDATE_TICKS,
                TimerEvent::AdvDataUpdate,
            )?;
        }
        Ok(())
    }

    fn update_gesture_data<S, B, P>(&mut self, board: &mut Board<S, B, P>) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        match read_sample(&mut board.sensor) {
            Ok(raw) => {
                let smoothed = self.sampler.sample_tick(raw);
                if let Some(code) = self.classifier.classify(smoothed) {
                    log::debug!(
                        "Gesture {:?} (x:{}, y:{}) in slot {}",
                        code,
                        smoothed.x,
                        smoothed.y,
                        self.payload().cursor()
                    );
                    self.record_gesture(code, board)?;
                }
            }
            Err(e) => log::warn!("Accelerometer read failed, skipping sample: {:?}", e),
        }

        // First tick after a wake arms the sleep countdown even without motion.
        if self.lifecycle.take_just_woke() {
            self.retained.timers.restart(
                &mut board.timers,
                GESTURE_DISPLAY_RESET_TICKS,
                TimerEvent::GestureDisplayReset,
            )?;
        }
        Ok(())
    }

    fn record_gesture<S, B, P>(&mut self, code: GestureCode, board: &mut Board<S, B, P>) -> WandResult<()> {
        self.retained.mnf_data.payload.append(code);
        let timers = &mut self.retained.timers;
        timers.restart(&mut board.timers, GESTURE_LOCKOUT_TICKS, TimerEvent::GestureLockout)?;
        timers.restart(
            &mut board.timers,
            GESTURE_DISPLAY_RESET_TICKS,
            TimerEvent::GestureDisplayReset,
        )
    }

    fn display_reset<S, B, P>(&mut self, board: &mut Board<S, B, P>) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        self.retained.mnf_data.payload.clear();
        log::info!("Gesture display reset");
        self.enter_sleep(board);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sleep / wake
    // -----------------------------------------------------------------------

    pub fn enter_sleep<S, B, P>(&mut self, board: &mut Board<S, B, P>)
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        self.retained.publisher.set_continue_updating(false);
        self.retained
            .timers
            .cancel(&mut board.timers, TimerEvent::AdvDataUpdate);

        if let Err(e) = board.sensor.enter_low_power_interrupt_mode() {
            log::warn!("Accelerometer low-power mode failed: {:?}", e);
        }
        log::info!("System going to sleep");

        board.ble.stop_advertising();
        self.advertising = false;

        board.power.enter_extended_sleep();
        board.power.arm_external_wakeup();
        board.power.reset_wakeup_event_counter();
        self.lifecycle.sleep();
    }

    pub fn wake<S, B, P>(&mut self, board: &mut Board<S, B, P>) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        if !self.lifecycle.wake() {
            log::debug!("Wake trigger while {:?}, ignored", self.lifecycle.state());
            return Ok(());
        }

        if let Err(e) = board.sensor.init() {
            log::warn!("Accelerometer init failed: {:?}", e);
        }
        self.sampler.reset();
        self.classifier.unlock();

        log::info!("Motor starting");
        self.retained
            .timers
            .restart(&mut board.timers, MOTOR_ON_TICKS, TimerEvent::MotorOn)?;
        board.power.set_motor(true);
        Ok(())
    }

    fn motor_done<S, B, P>(&mut self, board: &mut Board<S, B, P>) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        log::info!("Motor stopping");
        board.power.set_motor(false);
        self.retained.publisher.set_continue_updating(true);
        self.lifecycle.motor_done();

        if !self.advertising && self.retained.connection.is_none() {
            self.start_advertising(board)
        } else {
            self.retained.timers.restart(
                &mut board.timers,
                ADV_DATA_UPDATE_TICKS,
                TimerEvent::AdvDataUpdate,
            )
        }
    }

    // -----------------------------------------------------------------------
    // BLE notifications
    // -----------------------------------------------------------------------

    pub fn on_ble_event<S, B, P>(&mut self, event: BleEvent, board: &mut Board<S, B, P>) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        match event {
            BleEvent::Connected { conidx, params } => self.on_connection(conidx, params, board),
            BleEvent::ConnectionFailed => {
                log::warn!("Connection indication without a link, restarting advertising");
                self.start_advertising(board)
            }
            BleEvent::Disconnected { conidx, reason } => {
                log::info!("Connection {} closed (reason 0x{:02X})", conidx, reason);
                self.on_disconnect(board)
            }
            BleEvent::AdvertiseComplete(status) => self.on_advertise_complete(status, board),
            BleEvent::ParamsUpdated(params) => {
                if PREFERRED_CONNECTION.accepts(&params) {
                    log::info!("Connection parameters updated to preferred {:?}", params);
                } else {
                    log::warn!("Connection parameters updated to {:?}, not preferred", params);
                }
                Ok(())
            }
        }
    }

    fn on_connection<S, B, P>(
        &mut self,
        conidx: ConnectionId,
        params: ConnectionParams,
        board: &mut Board<S, B, P>,
    ) -> WandResult<()> {
        log::info!("Connected ({}) with {:?}", conidx, params);
        self.retained.connection = Some(conidx);
        self.advertising = false;
        self.retained
            .timers
            .cancel(&mut board.timers, TimerEvent::AdvDataUpdate);

        if !PREFERRED_CONNECTION.accepts(&params) {
            self.retained.timers.restart(
                &mut board.timers,
                PARAM_UPDATE_REQUEST_TICKS,
                TimerEvent::ParamUpdateRequest,
            )?;
        }
        Ok(())
    }

    fn on_disconnect<S, B, P>(&mut self, board: &mut Board<S, B, P>) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        self.retained.connection = None;
        self.retained
            .timers
            .cancel(&mut board.timers, TimerEvent::ParamUpdateRequest);

        if self.lifecycle.is_asleep() {
            // Advertising resumes with the next wake.
            return Ok(());
        }
        self.update_gesture_data(board)?;
        self.start_advertising(board)
    }

    fn on_advertise_complete<S, B, P>(
        &mut self,
        status: AdvertiseStatus,
        board: &mut Board<S, B, P>,
    ) -> WandResult<()>
    where
        S: AxisSource,
        B: BleStack,
        P: PowerControl,
    {
        if status != AdvertiseStatus::Canceled {
            return Ok(());
        }
        self.advertising = false;
        if self.lifecycle.is_asleep() || self.retained.connection.is_some() {
            return Ok(());
        }
        self.start_advertising(board)
    }
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn read_sample<S: AxisSource>(sensor: &mut S) -> Result<RawSample, S::Error> {
    let x = sensor.read_axis(Axis::X)?;
    let y = sensor.read_axis(Axis::Y)?;
    // Z is sampled with the others but takes no part in classification.
    let _z = sensor.read_axis(Axis::Z)?;
    Ok(RawSample { x, y })
}
