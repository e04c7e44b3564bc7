//! CocoaPods integration: a podspec vending the SDK frameworks and the
//! matching `pod` line in the project's Podfile.

use std::path::Path;

use anyhow::Result;
use regex::{Captures, Regex};

use crate::util::fs as ace_fs;

/// Name of the pod the SDK is published as.
pub const POD_NAME: &str = "arkui-x";

/// SDK-relative paths of the named frameworks, found breadth-first.
///
/// Names that are not `.xcframework` bundles or cannot be found are skipped.
pub fn vendored_frameworks<'n>(
    sdk_root: &Path,
    names: impl IntoIterator<Item = &'n str>,
) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for name in names {
        if !name.ends_with(".xcframework") {
            continue;
        }
        match ace_fs::find_breadth_first(sdk_root, name) {
            Some(path) => {
                let path = path.to_string_lossy().replace('\\', "/");
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
            None => tracing::warn!("{} not found under {}", name, sdk_root.display()),
        }
    }
    paths
}

/// The podspec text for a list of vendored framework paths.
pub fn render_podspec(vendored: &[String]) -> String {
    let frameworks = vendored
        .iter()
        .map(|p| format!("\"{}\"", p))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r##"
Pod::Spec.new do |spec|

  spec.name          = "{name}"
  spec.version       = "1.0.0"
  spec.summary       = "The ArkUI-X project extends the ArkUI framework to multiple OS platforms."
  spec.description   = <<-DESC
    The ArkUI-X project extends the ArkUI framework to multiple OS platforms.
    This enables developers to use one main set of code to develop applications for multiple OS platforms.
  DESC
  spec.homepage      = "https://arkui-x.cn"
  spec.license       = {{ :type => "Apache" }}
  spec.author        = {{ "ArkUI Dev Team" => "contact@mail.arkui-x.cn" }}
  spec.source        = {{ :git => "https://gitcode.com/arkui-x", :tag => "#{{spec.version}}" }}
  spec.ios.deployment_target = '10.0'
  spec.vendored_frameworks = {frameworks}

end"##,
        name = POD_NAME,
        frameworks = frameworks
    )
}

/// The Podfile line pulling the SDK pod from `sdk_root`.
pub fn pod_line(sdk_root: &Path) -> String {
    format!("\n  pod '{}', :path => '{}'", POD_NAME, sdk_root.display())
}

/// Result of adding the SDK pod to a Podfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodfileEdit {
    /// The line is already there.
    Unchanged,
    /// The new Podfile text.
    Inserted(String),
    /// No `target '<name>' do ... end` block to insert into.
    NoTarget,
}

/// Insert the SDK pod into the `target` block of a Podfile.
pub fn insert_pod(podfile: &str, target: &str, sdk_root: &Path) -> Result<PodfileEdit> {
    let line = pod_line(sdk_root);
    if podfile.contains(&line) {
        return Ok(PodfileEdit::Unchanged);
    }

    let block = Regex::new(&format!(
        r#"(target\s+['"]{}['"]\s+do\s*[\s\S]*?)(\n\s*end)"#,
        regex::escape(target)
    ))?;
    if !block.is_match(podfile) {
        return Ok(PodfileEdit::NoTarget);
    }

    let updated = block.replacen(podfile, 1, |caps: &Captures| {
        format!("{}{}{}", &caps[1], line, &caps[2])
    });
    Ok(PodfileEdit::Inserted(updated.into_owned()))
}
