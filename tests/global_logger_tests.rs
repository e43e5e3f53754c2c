/// The process-wide logger lives for the whole test binary, so this file
/// holds a single test.
use logroute::logging::{self, Event, Handler, HandlerError, Level, Subscription};
use logroute::{log_error, log_event, log_info};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(Level, String, Option<&'static str>)>>,
}

impl Handler for Recorder {
    fn write(&self, event: &Event) -> Result<(), HandlerError> {
        self.events.lock().unwrap().push((
            event.level().clone(),
            event.message().to_string(),
            event.call_site().module,
        ));
        Ok(())
    }
}

#[test]
fn test_macros_buffer_then_route_through_global() {
    log_info!("booting {}", 1);
    log_event!(Level::access(), "early access");
    assert!(!logging::global().core().is_ready());
    assert_eq!(logging::global().core().pending_count(), 2);

    let recorder = Arc::new(Recorder::default());
    logging::global()
        .initialize(vec![Subscription::new(
            recorder.clone(),
            [Level::Info, Level::Error, Level::access()],
        )])
        .unwrap();
    log_error!("after ready");

    let events = recorder.events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.contains(&(Level::Info, "booting 1".to_string(), Some("global_logger_tests"))));
    assert!(events.contains(&(Level::access(), "early access".to_string(), Some("global_logger_tests"))));
    assert_eq!(events[2], (Level::Error, "after ready".to_string(), Some("global_logger_tests")));
}
