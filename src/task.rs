// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/task.rs - 事件驱动的监测任务
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{thread, time::Duration};

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  alert::{AlertDispatcher, AlertSink, DispatchReport},
  config::{Settings, SettingsError, SettingsStore},
  frame::LandmarkFrame,
  input::MonitorEvent,
  monitor::{FrameOutcome, MonitorError, PostureMonitor},
  output::Render,
};

#[derive(Error, Debug)]
pub enum WatchError {
  #[error("还没有收到任何关键点帧")]
  NoFrame,
  #[error(transparent)]
  Monitor(#[from] MonitorError),
  #[error("设置保存失败: {0}")]
  Settings(#[from] SettingsError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchStep {
  Frame {
    frame: LandmarkFrame,
    outcome: FrameOutcome,
    report: DispatchReport,
  },
  ReferenceSet,
  SettingsUpdated(Settings),
  Environment,
  TestAlert(DispatchReport),
  Stopped,
}

/// 监测器、提醒分发与设置存储的组合，一次处理一个事件
pub struct Watcher<S> {
  monitor: PostureMonitor,
  dispatcher: AlertDispatcher<S>,
  store: Option<SettingsStore>,
  last_frame: Option<LandmarkFrame>,
}

impl<S: AlertSink> Watcher<S> {
  pub fn new(monitor: PostureMonitor, dispatcher: AlertDispatcher<S>) -> Self {
    Self {
      monitor,
      dispatcher,
      store: None,
      last_frame: None,
    }
  }

  /// 设置变更时写回该文件
  pub fn with_store(mut self, store: SettingsStore) -> Self {
    self.store = Some(store);
    self
  }

  pub fn monitor(&self) -> &PostureMonitor {
    &self.monitor
  }

  pub fn dispatcher(&self) -> &AlertDispatcher<S> {
    &self.dispatcher
  }

  pub fn last_frame(&self) -> Option<&LandmarkFrame> {
    self.last_frame.as_ref()
  }

  pub fn into_parts(self) -> (PostureMonitor, AlertDispatcher<S>) {
    (self.monitor, self.dispatcher)
  }

  pub fn handle(&mut self, event: MonitorEvent) -> Result<WatchStep, WatchError> {
    match event {
      MonitorEvent::Frame(frame) => {
        let outcome = self
          .monitor
          .process_frame(frame.landmarks(), frame.timestamp_ms);
        let report = self.dispatcher.dispatch(&outcome);
        self.last_frame = Some(frame.clone());
        Ok(WatchStep::Frame {
          frame,
          outcome,
          report,
        })
      }
      MonitorEvent::SetReference => {
        let frame = self.last_frame.as_ref().ok_or(WatchError::NoFrame)?;
        let landmarks = frame.landmarks().ok_or(MonitorError::SubjectAbsent)?;
        self.monitor.set_reference(landmarks)?;
        self.dispatcher.clear();
        Ok(WatchStep::ReferenceSet)
      }
      MonitorEvent::UpdateConfig(update) => {
        // 先写盘再生效，保存失败时内存中的设置保持不变
        let next = self
          .monitor
          .settings()
          .apply(&update)
          .map_err(MonitorError::from)?;
        if let Some(store) = &self.store {
          store.save(&next)?;
          debug!("设置已写入 {}", store.path().display());
        }
        let settings = self.monitor.update_config(&update)?;
        Ok(WatchStep::SettingsUpdated(settings))
      }
      MonitorEvent::Visibility { foreground } => {
        self.dispatcher.set_foreground(foreground);
        Ok(WatchStep::Environment)
      }
      MonitorEvent::Permission { permission } => {
        self.dispatcher.set_permission(permission);
        Ok(WatchStep::Environment)
      }
      MonitorEvent::TestAlert => {
        let now_ms = self.last_frame.as_ref().map_or(0.0, |f| f.timestamp_ms);
        Ok(WatchStep::TestAlert(self.dispatcher.test_alert(now_ms)))
      }
      MonitorEvent::Stop => {
        self.monitor.stop();
        self.dispatcher.clear();
        Ok(WatchStep::Stopped)
      }
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskSummary {
  pub events: usize,
  pub frames: usize,
  pub alerts: usize,
  /// 被拒绝的事件（例如无人时设置基准）
  pub rejected: usize,
}

pub trait Task<I, W, O>: Sized {
  type Error;
  fn run_task(self, input: I, watcher: W, output: O) -> Result<TaskSummary, Self::Error>;
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  handle_interrupt: bool,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 注册 Ctrl-C 处理；每个进程只能注册一次
  pub fn with_interrupt(mut self, handle_interrupt: bool) -> Self {
    self.handle_interrupt = handle_interrupt;
    self
  }
}

impl<
  'a,
  S: AlertSink,
  IE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<MonitorEvent, IE>>,
  O: Render<LandmarkFrame, FrameOutcome, Error = RE>,
> Task<I, &'a mut Watcher<S>, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, watcher: &'a mut Watcher<S>, output: O) -> Result<TaskSummary, Self::Error> {
    info!("开始监测任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    if self.handle_interrupt {
      ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        let _ = tx.send(());
        thread::spawn(|| {
          thread::sleep(Duration::from_secs(30));
          warn!("强制退出程序");
          std::process::exit(1);
        });
      })
      .context("无法设置 Ctrl-C 处理函数")?;
    } else {
      drop(tx);
    }

    let mut summary = TaskSummary::default();
    for event in input {
      let event = event.context("读取事件失败")?;
      summary.events += 1;

      match watcher.handle(event) {
        Ok(WatchStep::Frame {
          frame,
          outcome,
          report,
        }) => {
          summary.frames += 1;
          if outcome.should_alert {
            summary.alerts += 1;
          }
          debug!(
            "第 {} 帧: {} 偏差 {:?} 通道 {:?}",
            summary.frames,
            outcome.state.name(),
            outcome.deviation_percent,
            report.fired
          );
          output.render_result(&frame, &outcome)?;
        }
        Ok(WatchStep::ReferenceSet) => info!("开始监测"),
        Ok(WatchStep::SettingsUpdated(settings)) => {
          info!("新设置生效: 阈值 {}%", settings.threshold_percent)
        }
        Ok(WatchStep::TestAlert(report)) => info!("测试提醒: {:?}", report.fired),
        Ok(WatchStep::Environment) | Ok(WatchStep::Stopped) => {}
        Err(e) => {
          summary.rejected += 1;
          warn!("事件被拒绝: {}", e);
        }
      }

      if self
        .frame_number
        .map(|n| summary.frames >= n)
        .unwrap_or(false)
      {
        info!("达到指定帧数 {}, 退出任务循环", summary.frames);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!(
      "任务完成: 事件 {} 个, 帧 {} 个, 提醒 {} 次",
      summary.events, summary.frames, summary.alerts
    );
    Ok(summary)
  }
}
