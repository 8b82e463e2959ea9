//! # 触发处理模块
//!
//! ## 设计思路
//!
//! 快捷键回调不直接执行业务，而是把 `TriggerEvent` 推入容量为 1 的通道；
//! 单个 worker 逐个取出并执行完整流程：
//!
//! ```text
//! 读剪贴板文本 → 查询增强 → 提供商编排 → 随机选取 → 下载规范化 → 写剪贴板
//! ```
//!
//! 通道满时（已有一次触发在排队）新的按键直接丢弃，因此任意时刻最多一个
//! 流程在执行、一个在等待，剪贴板写入不会交错。
//!
//! ## 实现思路
//!
//! - 每个阶段的失败都映射为 `TriggerError`，在 `handle` 中记录日志后吸收。
//! - 剪贴板读写是阻塞调用，经 `spawn_blocking` 执行。
//! - worker 把每次触发放进独立任务并等待其结束；任务 panic 只影响本次触发。

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::clipboard::{ClipboardError, ClipboardTextSource, ImageClipboardWriter};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::image_fetcher::ImageFetcher;
use crate::net::build_http_client;
use crate::query::QueryEnhancer;
use crate::random::RandomSource;
use crate::search::{ImageSearchProvider, ProviderAdapter, ProviderOrchestrator, Selector};
use crate::user_agent::UserAgentRotator;

/// 单次触发的失败原因。
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("剪贴板中没有可用的查询文本")]
    EmptyInput,

    #[error("所有提供商都没有返回候选图片")]
    NoCandidates,

    #[error("候选图片下载或解码失败")]
    FetchFailure,

    #[error("读取剪贴板失败：{0}")]
    ClipboardRead(ClipboardError),

    #[error("写入剪贴板失败：{0}")]
    ClipboardWrite(ClipboardError),
}

/// 一次触发的最终结果（供日志与测试断言）。
#[derive(Debug)]
pub enum TriggerOutcome {
    /// 图片已写入剪贴板。
    Copied { width: u32, height: u32 },
    /// 剪贴板没有可用文本，未发起搜索。
    Skipped,
    Failed(TriggerError),
}

/// 一次快捷键按下。
#[derive(Debug, Clone, Copy)]
pub struct TriggerEvent {
    pub received_at: Instant,
}

impl TriggerEvent {
    pub fn now() -> Self {
        Self {
            received_at: Instant::now(),
        }
    }
}

/// 触发事件的发送端，可在任意线程使用。
#[derive(Debug, Clone)]
pub struct TriggerSender {
    tx: mpsc::Sender<TriggerEvent>,
}

impl TriggerSender {
    /// 非阻塞投递；已有事件排队或 worker 已退出时返回 `false`。
    pub fn notify(&self) -> bool {
        match self.tx.try_send(TriggerEvent::now()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::info!("⏳ 上一次搜索尚未完成，忽略本次按键");
                false
            }
            Err(TrySendError::Closed(_)) => {
                log::warn!("⚠️ 触发 worker 已停止，按键被丢弃");
                false
            }
        }
    }
}

/// 创建单槽触发通道。
pub fn trigger_channel() -> (TriggerSender, mpsc::Receiver<TriggerEvent>) {
    let (tx, rx) = mpsc::channel(1);
    (TriggerSender { tx }, rx)
}

/// 一次触发的完整流程。
pub struct TriggerHandler<P = ProviderAdapter> {
    source: Arc<dyn ClipboardTextSource>,
    sink: Arc<dyn ImageClipboardWriter>,
    enhancer: QueryEnhancer,
    orchestrator: ProviderOrchestrator<P>,
    selector: Selector,
    fetcher: ImageFetcher,
}

impl TriggerHandler<ProviderAdapter> {
    /// 按配置组装生产流程，所有随机性共享同一个 `RandomSource`。
    pub fn from_config(
        config: &AppConfig,
        rng: Arc<RandomSource>,
        source: Arc<dyn ClipboardTextSource>,
        sink: Arc<dyn ImageClipboardWriter>,
    ) -> Result<Self, AppError> {
        let user_agents = UserAgentRotator::new(Arc::clone(&rng));
        let client = build_http_client(config.search.request_timeout)
            .map_err(|e| AppError::Runtime(format!("无法创建 HTTP 客户端：{}", e)))?;
        let providers = ProviderAdapter::all_from_config(&config.search, client, user_agents.clone());
        let fetcher = ImageFetcher::new(config.fetch.clone(), user_agents)
            .map_err(|e| AppError::Runtime(e.to_string()))?;

        Ok(Self::new(
            source,
            sink,
            QueryEnhancer::new(Arc::clone(&rng)),
            ProviderOrchestrator::new(providers, config.search.early_stop_threshold, Arc::clone(&rng)),
            Selector::new(rng),
            fetcher,
        ))
    }
}

impl<P: ImageSearchProvider + 'static> TriggerHandler<P> {
    pub fn new(
        source: Arc<dyn ClipboardTextSource>,
        sink: Arc<dyn ImageClipboardWriter>,
        enhancer: QueryEnhancer,
        orchestrator: ProviderOrchestrator<P>,
        selector: Selector,
        fetcher: ImageFetcher,
    ) -> Self {
        Self {
            source,
            sink,
            enhancer,
            orchestrator,
            selector,
            fetcher,
        }
    }

    /// 执行一次触发并记录结果；失败只体现在返回的 `TriggerOutcome` 中。
    pub async fn handle(&self, event: TriggerEvent) -> TriggerOutcome {
        let started = Instant::now();
        log::info!(
            "⌨️ 开始处理触发（排队 {}ms）",
            started.duration_since(event.received_at).as_millis()
        );

        let outcome = match self.run().await {
            Ok((width, height)) => TriggerOutcome::Copied { width, height },
            Err(TriggerError::EmptyInput) => TriggerOutcome::Skipped,
            Err(err) => TriggerOutcome::Failed(err),
        };

        let elapsed = started.elapsed().as_millis();
        match &outcome {
            TriggerOutcome::Copied { width, height } => {
                log::info!("🎉 {}x{} 图片已复制到剪贴板，耗时 {}ms", width, height, elapsed)
            }
            TriggerOutcome::Skipped => log::info!("📭 剪贴板为空，跳过本次搜索"),
            TriggerOutcome::Failed(err) => log::warn!("❌ 本次搜索未完成：{}（耗时 {}ms）", err, elapsed),
        }
        outcome
    }

    /// 执行一次触发，成功时返回写入剪贴板的位图尺寸。
    pub async fn run(&self) -> Result<(u32, u32), TriggerError> {
        let text = self.read_clipboard_text().await?;
        let query = self.enhancer.enhance(&text).map_err(|_| TriggerError::EmptyInput)?;
        log::info!("🔎 搜索：{}", query);

        let pool = self.orchestrator.resolve(&query).await;
        let candidate = self.selector.choose(pool).ok_or(TriggerError::NoCandidates)?;
        let bitmap = self.fetcher.fetch(&candidate).await.ok_or(TriggerError::FetchFailure)?;
        let dimensions = bitmap.dimensions();

        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || sink.write_image(&bitmap))
            .await
            .map_err(|e| TriggerError::ClipboardWrite(ClipboardError::Write(format!("线程执行失败：{}", e))))?
            .map_err(TriggerError::ClipboardWrite)?;

        Ok(dimensions)
    }

    async fn read_clipboard_text(&self) -> Result<String, TriggerError> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || source.read_text())
            .await
            .map_err(|e| TriggerError::ClipboardRead(ClipboardError::Read(format!("线程执行失败：{}", e))))?
            .map_err(TriggerError::ClipboardRead)
    }
}

/// 逐个处理触发事件，直到所有发送端关闭。
pub async fn run_trigger_worker<P>(handler: Arc<TriggerHandler<P>>, mut rx: mpsc::Receiver<TriggerEvent>)
where
    P: ImageSearchProvider + 'static,
{
    log::debug!("🧵 触发 worker 已启动");

    while let Some(event) = rx.recv().await {
        let handler = Arc::clone(&handler);
        let task = tokio::spawn(async move {
            handler.handle(event).await;
        });
        if let Err(err) = task.await {
            log::error!("💥 触发处理任务异常终止：{}", err);
        }
    }

    log::info!("🛑 触发通道已关闭，worker 退出");
}
