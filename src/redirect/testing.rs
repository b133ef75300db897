//! Resolver double shared by the redirect unit tests.

use futures_util::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::metadata::{MetadataResolver, ResolutionError, ResolutionResult};

#[derive(Clone, Copy)]
enum Answer {
    Echo,
    Fixed(Option<&'static str>),
    Fail,
}

/// Counts invocations and answers after an optional delay.
#[derive(Clone)]
pub(crate) struct FakeResolver {
    calls: Arc<AtomicUsize>,
    answer: Answer,
    delay: Option<Duration>,
}

impl FakeResolver {
    /// Answers `<account>/<distribution>`.
    pub(crate) fn echo() -> Self {
        Self::with_answer(Answer::Echo)
    }

    pub(crate) fn fixed(location: Option<&'static str>) -> Self {
        Self::with_answer(Answer::Fixed(location))
    }

    pub(crate) fn failing() -> Self {
        Self::with_answer(Answer::Fail)
    }

    fn with_answer(answer: Answer) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            answer,
            delay: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetadataResolver for FakeResolver {
    fn resolve(
        &self,
        account_id: &str,
        distribution_id: &str,
    ) -> BoxFuture<'static, ResolutionResult<Option<String>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let result = match self.answer {
            Answer::Echo => Ok(Some(format!("{account_id}/{distribution_id}"))),
            Answer::Fixed(location) => Ok(location.map(str::to_string)),
            Answer::Fail => Err(ResolutionError::Status {
                status: 403,
                resource: distribution_id.to_string(),
            }),
        };
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
        .boxed()
    }
}
