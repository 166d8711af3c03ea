/// A state value plus an "entered" flag, for running a state's entry action exactly once.
///
/// Setting a new value re-arms the guard, so each transition gets one more entry.
#[derive(Debug, Clone)]
pub struct OneTime<T> {
    data: T,
    happened: bool,
}

impl<T> OneTime<T> {
    pub fn new(data: T) -> Self {
        Self { data, happened: false }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    pub fn happened(&self) -> bool {
        self.happened
    }

    /// Returns true the first time it is called after the value was last set.
    pub fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.happened, true)
    }

    /// Runs `handler` with the current value if it has not run since the value was set.
    pub fn run(&mut self, handler: impl FnOnce(&T)) {
        if self.fire() {
            handler(&self.data);
        }
    }

    pub fn set(&mut self, data: T) {
        self.data = data;
        self.happened = false;
    }
}

impl<T: PartialEq> OneTime<T> {
    /// Re-arms only when `data` differs from the current value.
    pub fn set_if_changed(&mut self, data: T) -> bool {
        if self.data == data {
            return false;
        }
        self.set(data);
        true
    }
}
