/// Rising-edge detector over a sampled boolean.
///
/// Fires once on the first sample where the input is high after a low
/// sample. Holding the input high fires nothing further.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeTrigger {
    last: bool,
}

impl EdgeTrigger {
    /// Samples `pressed`; returns true on a low-to-high transition.
    pub fn update(&mut self, pressed: bool) -> bool {
        let fired = pressed && !self.last;
        self.last = pressed;
        fired
    }
}

/// Boolean flag flipped by the rising edge of an input.
#[derive(Debug, Clone, Copy)]
pub struct Toggle {
    value: bool,
    trigger: EdgeTrigger,
}

impl Toggle {
    pub fn new(initial: bool) -> Self {
        Self {
            value: initial,
            trigger: EdgeTrigger::default(),
        }
    }

    pub fn get(&self) -> bool {
        self.value
    }

    /// Samples `pressed`; returns true when the flag changed.
    pub fn update(&mut self, pressed: bool) -> bool {
        let fired = self.trigger.update(pressed);
        if fired {
            self.value = !self.value;
        }
        fired
    }
}
