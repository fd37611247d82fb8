// 该文件是 Duanzuo （端坐） 项目的一部分。
// tests/common/mod.rs - 测试用关键点帧
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

#![allow(dead_code)]

use duanzuo::keypoint::{Keypoint, LANDMARK_COUNT, Landmark};

pub const HEAD: [Landmark; 5] = [
  Landmark::Nose,
  Landmark::LeftEye,
  Landmark::RightEye,
  Landmark::LeftEar,
  Landmark::RightEar,
];

/// 肩膀在 (0,0)/(1,0)，鼻子在 (0.5,-0.3)；其余头部关键点与鼻子重合
pub fn reference_frame() -> Vec<Keypoint> {
  let mut frame = vec![Keypoint::new(0.5, 0.5, 0.0, 0.95); LANDMARK_COUNT];
  for mark in HEAD {
    frame[mark.index()] = Keypoint::new(0.5, -0.3, 0.0, 0.95);
  }
  frame[Landmark::LeftShoulder.index()] = Keypoint::new(0.0, 0.0, 0.0, 0.95);
  frame[Landmark::RightShoulder.index()] = Keypoint::new(1.0, 0.0, 0.0, 0.95);
  frame
}

/// 所有头部关键点向下移动 `dy`
pub fn head_dropped(dy: f64) -> Vec<Keypoint> {
  let mut frame = reference_frame();
  for mark in HEAD {
    frame[mark.index()].y += dy;
  }
  frame
}

/// 以肩部中点 (0.5, 0) 为中心缩放整帧
pub fn scaled(frame: &[Keypoint], k: f64) -> Vec<Keypoint> {
  frame
    .iter()
    .map(|p| Keypoint::new(0.5 + (p.x - 0.5) * k, p.y * k, p.z * k, p.visibility))
    .collect()
}

pub fn with_visibility(frame: &[Keypoint], marks: &[Landmark], visibility: f64) -> Vec<Keypoint> {
  let mut frame = frame.to_vec();
  for mark in marks {
    frame[mark.index()].visibility = visibility;
  }
  frame
}
