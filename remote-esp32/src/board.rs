//! Board buttons and LEDs
//!
//! Buttons are active-low inputs with pull-ups, sampled from the idle loop.
//! Each sample that differs from the previous one is reported the way a
//! button driver interrupt would: current levels plus the changed mask.

use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::sys::EspError;
use remote_mcu::{Led, StatusLeds};

pub struct BoardLeds {
    run: PinDriver<'static, AnyOutputPin, Output>,
    conn: PinDriver<'static, AnyOutputPin, Output>,
}

impl BoardLeds {
    pub fn new(run: AnyOutputPin, conn: AnyOutputPin) -> Result<Self, EspError> {
        let mut leds = Self {
            run: PinDriver::output(run)?,
            conn: PinDriver::output(conn)?,
        };
        leds.run.set_low()?;
        leds.conn.set_low()?;
        Ok(leds)
    }
}

impl StatusLeds for BoardLeds {
    type Error = EspError;

    fn set_led(&mut self, led: Led, on: bool) -> Result<(), EspError> {
        let pin = match led {
            Led::RunStatus => &mut self.run,
            Led::ConnStatus => &mut self.conn,
        };
        if on { pin.set_high() } else { pin.set_low() }
    }
}

pub struct Buttons {
    pins: Vec<PinDriver<'static, AnyIOPin, Input>>,
    last_state: u32,
}

impl Buttons {
    /// `pins[i]` is button i + 1
    pub fn new(pins: Vec<AnyIOPin>) -> Result<Self, EspError> {
        let mut drivers = Vec::with_capacity(pins.len());
        for pin in pins {
            let mut driver = PinDriver::input(pin)?;
            driver.set_pull(Pull::Up)?;
            drivers.push(driver);
        }
        let mut buttons = Self { pins: drivers, last_state: 0 };
        buttons.last_state = buttons.read_state();
        Ok(buttons)
    }

    fn read_state(&self) -> u32 {
        self.pins
            .iter()
            .enumerate()
            .filter(|(_, pin)| pin.is_low())
            .fold(0, |state, (i, _)| state | (1 << i))
    }

    /// Sample the buttons; `Some((button_state, has_changed))` on any change
    pub fn poll(&mut self) -> Option<(u32, u32)> {
        let state = self.read_state();
        let changed = state ^ self.last_state;
        self.last_state = state;
        (changed != 0).then_some((state, changed))
    }
}
