// Thinking-step progress reporting
//
// Purely a UX concern: steps announce pipeline stages to an observer and
// optionally pace them. Pacing is zero by default, which turns the waits
// into no-ops without changing observable behavior.

use std::sync::Arc;
use std::time::Duration;

/// Receives thinking-step messages as the pipeline advances
pub trait ThinkingObserver: Send + Sync {
    fn on_step(&self, message: &str);
}

/// Default observer: steps go to the log
pub struct LogObserver;

impl ThinkingObserver for LogObserver {
    fn on_step(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Emits step messages with optional pacing between pipeline stages
pub struct ThinkingSteps {
    observer: Arc<dyn ThinkingObserver>,
    pace: Duration,
}

impl ThinkingSteps {
    pub fn new(pace: Duration) -> Self {
        ThinkingSteps {
            observer: Arc::new(LogObserver),
            pace,
        }
    }

    pub fn with_observer(pace: Duration, observer: Arc<dyn ThinkingObserver>) -> Self {
        ThinkingSteps { observer, pace }
    }

    /// Announce a step and wait `pace * weight`. A zero pace skips the
    /// sleep entirely.
    pub async fn step(&self, message: &str, weight: f32) {
        self.observer.on_step(&format!("{}...", message));
        if !self.pace.is_zero() {
            tokio::time::sleep(self.pace.mul_f32(weight)).await;
        }
    }

    /// Announce the final message of the sequence
    pub async fn complete(&self) {
        self.observer.on_step("Respuesta generada");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingObserver {
        messages: Mutex<Vec<String>>,
    }

    impl ThinkingObserver for RecordingObserver {
        fn on_step(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn test_steps_reach_observer_in_order() {
        let observer = Arc::new(RecordingObserver {
            messages: Mutex::new(Vec::new()),
        });
        let steps = ThinkingSteps::with_observer(Duration::ZERO, observer.clone());

        steps.step("Analizando la consulta", 1.5).await;
        steps.step("Buscando información relevante", 2.0).await;
        steps.complete().await;

        let messages = observer.messages.lock().unwrap();
        assert_eq!(
            *messages,
            vec![
                "Analizando la consulta...",
                "Buscando información relevante...",
                "Respuesta generada"
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_pace_does_not_sleep() {
        let steps = ThinkingSteps::new(Duration::ZERO);
        let started = std::time::Instant::now();
        for _ in 0..100 {
            steps.step("paso", 10.0).await;
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
