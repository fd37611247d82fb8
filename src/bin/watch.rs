// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/bin/watch.rs - 读取关键点事件流并监测坐姿
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use duanzuo::{
  FromUrl,
  alert::{AlertDispatcher, AlertEnvironment, NotificationPermission},
  config::{ConfigUpdate, Settings, SettingsStore},
  input::InputWrapper,
  monitor::PostureMonitor,
  output::{ConsoleAlertSink, OutputWrapper},
  score::WeightProfile,
  task::{ContinuousTask, Task, Watcher},
};

/// Duanzuo 坐姿监测
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 事件来源，例如 events:///path/to/session.jsonl 或 stdin:
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出，可重复，例如 console: 或 record:///path/to/log.jsonl
  #[arg(long, value_name = "OUTPUT", default_value = "console:")]
  pub output: Vec<Url>,
  /// 设置文件；设置变更会写回该文件
  #[arg(long, value_name = "FILE")]
  pub settings: Option<PathBuf>,

  /// 偏差阈值（0-100）
  #[arg(long, value_name = "PERCENT")]
  pub threshold: Option<u8>,
  /// 持续不良多少秒后提醒
  #[arg(long, value_name = "SECONDS")]
  pub delay: Option<u32>,
  /// 权重方案: depth / planar
  #[arg(long, value_name = "PROFILE")]
  pub profile: Option<WeightProfile>,

  /// 以后台模式启动（提醒时闪烁终端标题）
  #[arg(long)]
  pub background: bool,
  /// 通知权限: granted / denied / undetermined
  #[arg(long, value_name = "PERMISSION", default_value = "undetermined")]
  pub permission: NotificationPermission,
  /// 不响铃
  #[arg(long)]
  pub no_bell: bool,

  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("事件来源: {}", args.input);
  for output in &args.output {
    info!("输出: {}", output);
  }

  let store = args.settings.clone().map(SettingsStore::new);
  let stored = match &store {
    Some(store) => store.load()?,
    None => Settings::default(),
  };
  let overrides = ConfigUpdate {
    threshold_percent: args.threshold,
    alert_delay_seconds: args.delay,
    profile: args.profile,
  };
  let settings = stored.apply(&overrides)?;
  info!(
    "阈值 {}%, 延迟 {}s, 权重方案 {}",
    settings.threshold_percent, settings.alert_delay_seconds, settings.profile
  );

  let input = InputWrapper::from_url(&args.input)?;
  let outputs = args
    .output
    .iter()
    .map(OutputWrapper::from_url)
    .collect::<Result<Vec<_>, _>>()?;

  let sink = ConsoleAlertSink::stderr("duanzuo").with_bell(!args.no_bell);
  let environment = AlertEnvironment {
    foreground: !args.background,
    permission: args.permission,
  };
  let dispatcher = AlertDispatcher::with_environment(sink, environment);
  let mut watcher = Watcher::new(PostureMonitor::new(settings), dispatcher);
  if let Some(store) = store {
    watcher = watcher.with_store(store);
  }

  let summary = ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_interrupt(true)
    .run_task(input.into_events(), &mut watcher, outputs)?;

  info!(
    "共处理 {} 帧，提醒 {} 次，拒绝事件 {} 个",
    summary.frames, summary.alerts, summary.rejected
  );
  Ok(())
}
