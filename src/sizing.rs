use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CPU architecture of the compute instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CpuArch {
    #[default]
    #[serde(rename = "ARM64", alias = "arm64")]
    Arm64,
    #[serde(rename = "X86_64", alias = "x86_64")]
    X86_64,
}

impl CpuArch {
    /// Instance family for this architecture.
    pub fn instance_class(&self) -> &'static str {
        match self {
            CpuArch::Arm64 => "m7g",
            CpuArch::X86_64 => "m5",
        }
    }

    /// Architecture name as used by machine image filters.
    pub fn image_arch(&self) -> &'static str {
        match self {
            CpuArch::Arm64 => "arm64",
            CpuArch::X86_64 => "x86_64",
        }
    }
}

impl FromStr for CpuArch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ARM64" | "ARM_64" => Ok(CpuArch::Arm64),
            "X86_64" | "X86" | "AMD64" => Ok(CpuArch::X86_64),
            other => Err(format!(
                "unknown cpu type '{}' (expected ARM64 or X86_64)",
                other
            )),
        }
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuArch::Arm64 => write!(f, "ARM64"),
            CpuArch::X86_64 => write!(f, "X86_64"),
        }
    }
}

/// Abstract instance size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizeClass {
    #[default]
    Large,
    Xlarge,
    Xlarge2,
    Xlarge4,
}

impl SizeClass {
    /// Parse a size class name. Unrecognized names fall back to `Large`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "LARGE" => SizeClass::Large,
            "XLARGE" => SizeClass::Xlarge,
            "XLARGE2" => SizeClass::Xlarge2,
            "XLARGE4" => SizeClass::Xlarge4,
            other => {
                tracing::debug!(size_class = other, "Unrecognized size class, using LARGE");
                SizeClass::Large
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Large => "LARGE",
            SizeClass::Xlarge => "XLARGE",
            SizeClass::Xlarge2 => "XLARGE2",
            SizeClass::Xlarge4 => "XLARGE4",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the concrete instance type, e.g. `m7g.xlarge`.
///
/// `size_class` is matched case-insensitively; anything unrecognized
/// resolves as `LARGE`.
pub fn resolve(cpu_arch: CpuArch, size_class: &str) -> String {
    let size = SizeClass::parse_lenient(size_class);
    format!(
        "{}.{}",
        cpu_arch.instance_class(),
        size.as_str().to_ascii_lowercase()
    )
}
