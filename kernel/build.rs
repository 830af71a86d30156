//! Tern 构建脚本
//!
//! 编译前运行，负责：
//! 1. 解析 Kernel.toml（或 menuconfig 生成的 build/.config）
//! 2. 在 OUT_DIR 生成 config.rs

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// 解析 build/.config 文件（section_key=value 格式）
fn parse_dot_config(content: &str) -> toml::Value {
    let mut sections: HashMap<String, toml::map::Map<String, toml::Value>> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some((section, config_key)) = key.split_once('_') else {
            continue;
        };

        let value = value.trim();
        let parsed = if value == "true" {
            toml::Value::Boolean(true)
        } else if value == "false" {
            toml::Value::Boolean(false)
        } else if let Ok(v) = value.parse::<i64>() {
            toml::Value::Integer(v)
        } else {
            toml::Value::String(value.to_string())
        };

        sections
            .entry(section.to_string())
            .or_default()
            .insert(config_key.to_string(), parsed);
    }

    let mut root = toml::map::Map::new();
    for (name, table) in sections {
        root.insert(name, toml::Value::Table(table));
    }
    toml::Value::Table(root)
}

fn int(config: &toml::Value, section: &str, key: &str, default: i64) -> i64 {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

fn string<'a>(config: &'a toml::Value, section: &str, key: &str, default: &'a str) -> &'a str {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or(default)
}

fn main() {
    println!("cargo:rerun-if-changed=../Kernel.toml");
    println!("cargo:rerun-if-changed=../build/.config");

    let content = fs::read_to_string("../build/.config")
        .or_else(|_| fs::read_to_string("../Kernel.toml"))
        .unwrap_or_default();

    let is_toml = content.lines().any(|line| {
        let trimmed = line.trim();
        trimmed.starts_with('[') && trimmed.ends_with(']')
    });

    let config = if is_toml {
        toml::from_str(&content).expect("Kernel.toml 解析失败")
    } else {
        parse_dot_config(&content)
    };

    let nproc = int(&config, "process", "nproc", 64);
    let nofile = int(&config, "process", "nofile", 16);
    let name_len = int(&config, "process", "name_len", 16);
    let max_cpus = int(&config, "smp", "max_cpus", 8);
    let quantum_base = int(&config, "scheduler", "quantum_base", 8);
    let quantum_step = int(&config, "scheduler", "quantum_step", 4);

    assert!(nproc > 0 && max_cpus > 0, "nproc 与 max_cpus 必须为正数");
    assert!(name_len > 0, "name_len 必须为正数");
    assert!(quantum_base > 0 && quantum_step >= 0, "时间片参数非法");

    let generated = format!(
        r#"// 由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

/// 内核名称
pub const KERNEL_NAME: &str = "{name}";

/// 内核版本
pub const KERNEL_VERSION: &str = "{version}";

/// 进程表槽位数
pub const NPROC: usize = {nproc};

/// 每进程打开文件数
pub const NOFILE: usize = {nofile};

/// 进程名长度
pub const PROC_NAME_LEN: usize = {name_len};

/// 最大 CPU 数量
pub const MAX_CPUS: usize = {max_cpus};

/// 最高优先级 (3) 的时间片滴答数
pub const QUANTUM_BASE: u32 = {quantum_base};

/// 每降一级增加的滴答数
pub const QUANTUM_STEP: u32 = {quantum_step};
"#,
        name = string(&config, "general", "name", "Tern"),
        version = string(&config, "general", "version", "0.1.0"),
    );

    let out = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR 未设置")).join("config.rs");
    fs::write(&out, generated).expect("无法写入 config.rs");
}
