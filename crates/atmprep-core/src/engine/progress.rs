use crate::core::models::observables::Observables;

#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart {
        name: &'static str,
    },
    PhaseFinish,

    /// End of one sampling cycle, with the engine readback of that cycle.
    CycleFinish {
        completed: u64,
        total: u64,
        observables: Observables,
    },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards protocol progress events to an optional callback; a reporter
/// without a callback swallows every event.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn events_reach_the_callback_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(format!("{event:?}"));
        }));

        reporter.report(Progress::PhaseStart { name: "Thermalize" });
        reporter.report(Progress::CycleFinish {
            completed: 1,
            total: 10,
            observables: Observables {
                potential_energy: -55_000.0,
                perturbation_energy: 0.0,
                temperature: 298.7,
                volume: 27_000.0,
            },
        });
        reporter.report(Progress::PhaseFinish);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].contains("Thermalize"));
    }

    #[test]
    fn reporter_without_callback_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("ignored".to_string()));
    }
}
