//! 推論サービスのスコープ付き取得
//!
//! `ServiceGuard::acquire` で start し、drop（または `ReleaseHandle::release`）で
//! stop を 1 回だけ呼ぶ。Ctrl-C ハンドラは別スレッドなので解放状態は AtomicBool で共有する。

use crate::error::Error;
use crate::ports::outbound::{Log, LogLevel, LogRecord, ServiceLifecycle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Inner {
    lifecycle: Arc<dyn ServiceLifecycle>,
    log: Arc<dyn Log>,
    released: AtomicBool,
}

impl Inner {
    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.lifecycle.stop() {
            Ok(()) => self.log.emit(
                LogRecord::new(LogLevel::Info, "service released")
                    .layer("service")
                    .kind("lifecycle"),
            ),
            Err(e) => self.log.emit(
                LogRecord::new(LogLevel::Warn, "service release failed")
                    .layer("service")
                    .kind("lifecycle")
                    .field("error", e.to_string()),
            ),
        }
    }
}

/// サービスの利用権。生きている間はサービスが起動している。
pub struct ServiceGuard {
    inner: Arc<Inner>,
}

/// ガードの外から解放するためのハンドル（Ctrl-C ハンドラ用）
#[derive(Clone)]
pub struct ReleaseHandle {
    inner: Arc<Inner>,
}

impl ServiceGuard {
    /// start に成功したときだけガードを返す。失敗時は stop を呼ばない。
    pub fn acquire(lifecycle: Arc<dyn ServiceLifecycle>, log: Arc<dyn Log>) -> Result<Self, Error> {
        lifecycle.start()?;
        log.emit(
            LogRecord::new(LogLevel::Info, "service acquired")
                .layer("service")
                .kind("lifecycle"),
        );
        Ok(Self {
            inner: Arc::new(Inner {
                lifecycle,
                log,
                released: AtomicBool::new(false),
            }),
        })
    }

    pub fn handle(&self) -> ReleaseHandle {
        ReleaseHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }

    /// 明示的に解放する（drop でも同じ）
    pub fn release(self) {
        self.inner.release();
    }
}

impl ReleaseHandle {
    pub fn release(&self) {
        self.inner.release();
    }
}

impl Drop for ServiceGuard {
    fn drop(&mut self) {
        self.inner.release();
    }
}
