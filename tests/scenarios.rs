// 该文件是 Duanzuo （端坐） 项目的一部分。
// tests/scenarios.rs - 典型坐姿场景
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

mod common;

use duanzuo::{
  config::Settings,
  keypoint::Landmark,
  monitor::{PostureMonitor, PostureState},
  pose::normalize_slice,
  presence::PresenceFilter,
  score::{Cause, Lean, Scorer, WeightProfile},
};

use common::*;

fn monitoring() -> PostureMonitor {
  let mut monitor = PostureMonitor::new(Settings::default());
  monitor.set_reference(&reference_frame()).unwrap();
  monitor
}

#[test]
fn identical_frame_has_no_deviation() {
  let mut monitor = monitoring();
  let outcome = monitor.process_frame(Some(&reference_frame()), 0.0);
  assert_eq!(outcome.deviation.unwrap().final_error, 0.0);
  assert_eq!(outcome.deviation_percent, Some(0));
  assert_eq!(outcome.state, PostureState::Good);
}

#[test]
fn single_nose_drop_is_diluted_below_threshold() {
  let mut frame = reference_frame();
  frame[Landmark::Nose.index()].y += 0.1;

  let reference = normalize_slice(&reference_frame()).unwrap();
  let current = normalize_slice(&frame).unwrap();
  let deviation = Scorer::default().score(&current, &reference);
  assert!((deviation.final_error - 0.12 / 7.0).abs() < 1e-12);
  assert_eq!(deviation.percent(350.0), 6);

  let threshold = Settings::default().deviation_threshold();
  assert!((threshold - 60.0 / 350.0).abs() < 1e-12);

  let mut monitor = monitoring();
  for step in 0..80 {
    let outcome = monitor.process_frame(Some(&frame), step as f64 * 125.0);
    assert_eq!(outcome.state, PostureState::Good);
    assert!(!outcome.should_alert);
  }
}

#[test]
fn bad_only_after_three_seconds_over_threshold() {
  let frame = head_dropped(0.5);
  let mut monitor = monitoring();

  for step in 0..24 {
    let outcome = monitor.process_frame(Some(&frame), step as f64 * 125.0);
    assert!(outcome.over_threshold);
    assert_eq!(outcome.state, PostureState::Warning, "step {}", step);
  }
  let outcome = monitor.process_frame(Some(&frame), 24.0 * 125.0);
  assert_eq!(outcome.accumulated_seconds, 3.0);
  assert_eq!(outcome.state, PostureState::Bad);
  assert!(outcome.should_alert);
  assert!(outcome.overlay);
}

#[test]
fn interrupted_slouch_starts_decaying() {
  let slouch = head_dropped(0.5);
  let mut monitor = monitoring();
  for step in 0..17 {
    monitor.process_frame(Some(&slouch), step as f64 * 125.0);
  }
  assert_eq!(monitor.session().accumulated_seconds(), 2.0);

  // 端正 0.5 秒，按两倍速度衰减掉 1 秒
  for step in 17..21 {
    monitor.process_frame(Some(&reference_frame()), step as f64 * 125.0);
  }
  assert_eq!(monitor.session().accumulated_seconds(), 1.0);
  assert_eq!(monitor.state(), PostureState::Warning);

  for step in 21..29 {
    monitor.process_frame(Some(&slouch), step as f64 * 125.0);
  }
  assert_eq!(monitor.session().accumulated_seconds(), 2.0);
  assert_eq!(monitor.state(), PostureState::Warning);
}

#[test]
fn narrower_shoulders_read_as_leaning_back() {
  let reference = normalize_slice(&reference_frame()).unwrap();
  let current = normalize_slice(&scaled(&reference_frame(), 0.7)).unwrap();
  let deviation = Scorer::default().score(&current, &reference);

  assert!((deviation.scale_ratio - 0.7).abs() < 1e-12);
  assert!((deviation.scale_error - 0.225).abs() < 1e-12);
  assert!(deviation.base_error.abs() < 1e-12);
  assert!((deviation.final_error - deviation.base_error - 0.225).abs() < 1e-12);
  assert_eq!(deviation.lean, Lean::Backward);
  assert_eq!(deviation.cause(), Cause::TooFar);
}

#[test]
fn wider_shoulders_read_as_too_close() {
  let reference = normalize_slice(&reference_frame()).unwrap();
  let current = normalize_slice(&scaled(&reference_frame(), 1.2)).unwrap();
  let deviation = Scorer::new(WeightProfile::Planar).score(&current, &reference);
  assert_eq!(deviation.lean, Lean::Forward);
  assert!((deviation.scale_error - 0.24).abs() < 1e-9);
  assert_eq!(deviation.cause(), Cause::TooClose);
}

#[test]
fn low_shoulder_confidence_means_away() {
  let frame = with_visibility(
    &reference_frame(),
    &[Landmark::LeftShoulder, Landmark::RightShoulder],
    0.5,
  );
  let frame = with_visibility(&frame, &[Landmark::Nose], 0.99);
  assert!(!PresenceFilter::default().is_present(&frame));

  let mut monitor = monitoring();
  monitor.process_frame(Some(&head_dropped(0.5)), 0.0);
  monitor.process_frame(Some(&head_dropped(0.5)), 125.0);
  let outcome = monitor.process_frame(Some(&frame), 250.0);
  assert_eq!(outcome.state, PostureState::Away);
  assert_eq!(outcome.deviation_percent, None);
  assert!(!outcome.should_alert);
  assert_eq!(monitor.session().accumulated_seconds(), 0.0);
}

#[test]
fn reference_refused_without_subject() {
  let frame = with_visibility(
    &reference_frame(),
    &[Landmark::LeftShoulder, Landmark::RightShoulder],
    0.5,
  );
  let mut monitor = PostureMonitor::new(Settings::default());
  assert!(monitor.set_reference(&frame).is_err());
  assert_eq!(monitor.state(), PostureState::Idle);
}
