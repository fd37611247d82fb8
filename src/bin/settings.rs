// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/bin/settings.rs - 查看与修改监测设置
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

use duanzuo::{
  config::{ConfigUpdate, SettingsStore},
  score::WeightProfile,
};

/// Duanzuo 设置文件工具；不带修改参数时只打印当前设置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[arg(long, value_name = "FILE")]
  pub settings: PathBuf,

  /// 偏差阈值（0-100）
  #[arg(long, value_name = "PERCENT")]
  pub threshold: Option<u8>,
  /// 持续不良多少秒后提醒
  #[arg(long, value_name = "SECONDS")]
  pub delay: Option<u32>,
  /// 权重方案: depth / planar
  #[arg(long, value_name = "PROFILE")]
  pub profile: Option<WeightProfile>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  let store = SettingsStore::new(&args.settings);
  let update = ConfigUpdate {
    threshold_percent: args.threshold,
    alert_delay_seconds: args.delay,
    profile: args.profile,
  };

  let settings = if update.is_empty() {
    store.load()?
  } else {
    let settings = store.update(&update)?;
    info!("设置已保存到 {}", store.path().display());
    settings
  };

  println!("{}", serde_json::to_string_pretty(&settings)?);
  Ok(())
}
