//! GPU controller discovery via `lspci` (Linux) or `system_profiler` (macOS).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::monitor::error::{SourceError, SourceResult};
use crate::monitor::sampler::GpuInfo;

static LSPCI_GPU: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\S+\s+(?:VGA compatible controller|3D controller|Display controller):\s*(.+?)(?:\s+\(rev [0-9a-fA-F]+\))?$")
        .expect("Invalid lspci regex")
});

static VRAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^VRAM[^:]*:\s*(\d+)\s*(MB|GB)").expect("Invalid VRAM regex")
});

pub async fn query() -> SourceResult<Vec<GpuInfo>> {
    #[cfg(target_os = "linux")]
    {
        let stdout = run("lspci", &[]).await?;
        Ok(parse_lspci(&stdout))
    }

    #[cfg(target_os = "macos")]
    {
        let stdout = run("system_profiler", &["SPDisplaysDataType"]).await?;
        Ok(parse_system_profiler(&stdout))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Err(SourceError::Unsupported("gpu discovery"))
    }
}

#[cfg_attr(not(any(target_os = "linux", target_os = "macos")), allow(dead_code))]
async fn run(program: &'static str, args: &[&str]) -> SourceResult<String> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            // tool not installed
            std::io::ErrorKind::NotFound => SourceError::Unsupported(program),
            _ => SourceError::Io(e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::Unavailable(format!(
            "{} failed: {}",
            program,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg_attr(not(any(target_os = "linux", target_os = "macos")), allow(dead_code))]
pub fn vendor_of(description: &str) -> String {
    let lower = description.to_lowercase();
    if lower.contains("nvidia") {
        "NVIDIA".to_string()
    } else if lower.contains("intel") {
        "Intel".to_string()
    } else if lower.contains("amd") || lower.contains("ati ") || lower.contains("advanced micro devices") {
        "AMD".to_string()
    } else if lower.contains("apple") {
        "Apple".to_string()
    } else {
        description
            .split_whitespace()
            .next()
            .unwrap_or("Unknown")
            .to_string()
    }
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub fn parse_lspci(output: &str) -> Vec<GpuInfo> {
    output
        .lines()
        .filter_map(|line| LSPCI_GPU.captures(line.trim()))
        .map(|caps| {
            let model = caps[1].trim().to_string();
            GpuInfo {
                vendor: vendor_of(&model),
                model,
                vram_mb: None,
            }
        })
        .collect()
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub fn parse_system_profiler(output: &str) -> Vec<GpuInfo> {
    let mut gpus: Vec<GpuInfo> = Vec::new();

    for line in output.lines().map(str::trim) {
        if let Some(model) = line.strip_prefix("Chipset Model:") {
            let model = model.trim().to_string();
            gpus.push(GpuInfo {
                vendor: vendor_of(&model),
                model,
                vram_mb: None,
            });
            continue;
        }

        let Some(current) = gpus.last_mut() else {
            continue;
        };

        if let Some(vendor) = line.strip_prefix("Vendor:") {
            let vendor = vendor.split('(').next().unwrap_or(vendor).trim();
            if !vendor.is_empty() {
                current.vendor = vendor.to_string();
            }
        } else if let Some(caps) = VRAM.captures(line) {
            let amount: u64 = caps[1].parse().unwrap_or(0);
            current.vram_mb = Some(if &caps[2] == "GB" { amount * 1024 } else { amount });
        }
    }

    gpus
}
