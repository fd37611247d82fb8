// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/output/view.rs - 判定结果到界面状态的映射
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

use crate::{
  monitor::{FrameOutcome, PostureState},
  score::Cause,
};

/// 累计超过该秒数后骨架改为警告色
pub const WARNING_COLOR_AFTER_SECONDS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
  /// 未监测
  Neutral,
  Good,
  Warning,
  Alert,
  /// 次要文字色
  Muted,
}

impl StatusColor {
  pub fn hex(self) -> &'static str {
    match self {
      StatusColor::Neutral => "#3b82f6",
      StatusColor::Good => "#10b981",
      StatusColor::Warning => "#f59e0b",
      StatusColor::Alert => "#ef4444",
      StatusColor::Muted => "#9ca3af",
    }
  }

  /// 终端 ANSI 前景色
  pub fn ansi(self) -> &'static str {
    match self {
      StatusColor::Neutral => "\x1b[34m",
      StatusColor::Good => "\x1b[32m",
      StatusColor::Warning => "\x1b[33m",
      StatusColor::Alert => "\x1b[31m",
      StatusColor::Muted => "\x1b[90m",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
  pub landmark_color: StatusColor,
  pub headline: String,
  pub headline_color: StatusColor,
  pub deviation_text: String,
  pub overlay: bool,
}

pub fn status_view(outcome: &FrameOutcome) -> StatusView {
  let landmark_color = match outcome.state {
    PostureState::Idle | PostureState::Away => StatusColor::Neutral,
    PostureState::Bad => StatusColor::Alert,
    _ if outcome.accumulated_seconds > WARNING_COLOR_AFTER_SECONDS => StatusColor::Warning,
    _ => StatusColor::Good,
  };

  let (headline, headline_color) = match outcome.state {
    PostureState::Idle => (
      "请坐端正，然后设置基准姿势".to_string(),
      StatusColor::Muted,
    ),
    PostureState::Away => ("未检测到用户（提醒暂停）".to_string(), StatusColor::Muted),
    PostureState::Bad => {
      let cause = outcome
        .deviation
        .map(|d| d.cause())
        .unwrap_or(Cause::Slouching);
      let text = match cause {
        Cause::Slouching => "姿势不正！",
        Cause::TooClose => "注意乌龟颈：离屏幕太近！",
        Cause::TooFar => "离屏幕太远了！",
      };
      (text.to_string(), StatusColor::Alert)
    }
    PostureState::Warning if outcome.over_threshold => (
      format!("注意（{} 秒后提醒）", outcome.remaining_seconds()),
      StatusColor::Warning,
    ),
    PostureState::Warning | PostureState::Good => ("姿势端正".to_string(), StatusColor::Good),
  };

  let deviation_text = match (outcome.state, outcome.deviation_percent) {
    (PostureState::Away, _) => "-".to_string(),
    (_, Some(percent)) => format!("{}%", percent),
    (_, None) => "0%".to_string(),
  };

  StatusView {
    landmark_color,
    headline,
    headline_color,
    deviation_text,
    overlay: outcome.overlay,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::score::{Deviation, Lean};

  fn outcome(state: PostureState, accumulated_seconds: f64, over_threshold: bool) -> FrameOutcome {
    FrameOutcome {
      timestamp_ms: 0.0,
      state,
      deviation_percent: Some(42),
      deviation: Some(Deviation {
        base_error: 0.12,
        scale_error: 0.0,
        final_error: 0.12,
        scale_ratio: 1.0,
        lean: Lean::None,
      }),
      over_threshold,
      should_alert: false,
      overlay: state == PostureState::Bad,
      accumulated_seconds,
      alert_delay_seconds: 3.0,
      skipped: None,
    }
  }

  #[test]
  fn warning_colour_waits_half_a_second() {
    let early = status_view(&outcome(PostureState::Warning, 0.3, true));
    assert_eq!(early.landmark_color, StatusColor::Good);
    let late = status_view(&outcome(PostureState::Warning, 0.6, true));
    assert_eq!(late.landmark_color, StatusColor::Warning);
    assert_eq!(late.headline, "注意（3 秒后提醒）");
  }

  #[test]
  fn recovering_frame_reads_as_good() {
    let view = status_view(&outcome(PostureState::Warning, 1.0, false));
    assert_eq!(view.headline, "姿势端正");
    assert_eq!(view.headline_color, StatusColor::Good);
  }

  #[test]
  fn bad_state_uses_alert_colour_and_overlay() {
    let view = status_view(&outcome(PostureState::Bad, 3.5, true));
    assert_eq!(view.landmark_color, StatusColor::Alert);
    assert_eq!(view.headline, "姿势不正！");
    assert!(view.overlay);
    assert_eq!(view.deviation_text, "42%");
  }

  #[test]
  fn away_hides_deviation() {
    let mut away = outcome(PostureState::Away, 0.0, false);
    away.deviation_percent = None;
    let view = status_view(&away);
    assert_eq!(view.deviation_text, "-");
    assert_eq!(view.landmark_color, StatusColor::Neutral);
    assert!(!view.overlay);
  }
}
