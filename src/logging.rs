//! Logging setup / 日志初始化
//!
//! The subscriber is installed before the configuration is read, so the
//! filter sits behind a reload handle and `silent` is applied afterwards.
//! 先安装日志订阅器再读取配置，`silent` 通过重载句柄生效

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Default filter when `RUST_LOG` is unset / 未设置 `RUST_LOG` 时的默认过滤器
pub const DEFAULT_FILTER: &str = "cloudpush=info";

/// Filter used by `silent` mode / 静默模式过滤器
pub const SILENT_FILTER: &str = "error";

/// Handle for swapping the active filter / 切换过滤器的句柄
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Build a subscriber writing to `writer` / 构建写入 `writer` 的订阅器
pub fn subscriber<W>(filter: EnvFilter, writer: W) -> (impl Subscriber + Send + Sync + 'static, FilterHandle)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));
    (subscriber, handle)
}

/// Install the global subscriber, honouring `RUST_LOG` / 安装全局订阅器
pub fn init() -> FilterHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let (subscriber, handle) = subscriber(filter, std::io::stdout);
    subscriber.init();
    handle
}

/// Switch to errors only, unless `RUST_LOG` asks for something else
/// 切换为仅输出错误（`RUST_LOG` 优先）
pub fn apply_silent(handle: &FilterHandle, silent: bool) -> Result<(), reload::Error> {
    if silent && std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        handle.reload(EnvFilter::new(SILENT_FILTER))?;
    }
    Ok(())
}
