//! Implementation of `ace build`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::builder::icu::{IcuDataFilterBridge, IcuOutcome, IcuPlan};
use crate::builder::locator::{ArchitectureLibraryLocator, LibraryMap};
use crate::builder::pbxproj::{PbxprojSpliceEngine, ProjectKind, SpliceReport};
use crate::builder::sync::{SyncPlan, SyncReport};
use crate::builder::BuildContext;
use crate::ops::resolve::resolve_project;
use crate::resolver::ResolvedDependencySet;
use crate::util::fs::relative_path;
use crate::util::process::CommandRunner;
use crate::util::shell::{format_duration, Shell, Status};

/// Options for the build command not carried by [`BuildContext`].
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Ship ICU data with the native project
    pub icu: bool,

    /// API level used for the ICU gate (`None` = read from the project)
    pub api_version: Option<u32>,
}

/// What one build did, or would do in a dry run.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    /// Resolved module names, in resolution order.
    pub modules: Vec<String>,

    /// Requested modules the SDK does not define.
    pub unknown_modules: Vec<String>,

    /// One sync plan per sub-project and architecture.
    pub plans: Vec<SyncPlan>,

    /// Totals over every executed plan.
    pub sync: SyncReport,

    /// Project files spliced, with what changed in each.
    pub splices: Vec<(PathBuf, SpliceReport)>,

    /// Libraries declared by a module but missing from the SDK.
    pub missing_libraries: Vec<(String, PathBuf)>,

    pub icu: Option<IcuOutcome>,
}

/// Package the native libraries a project needs into its native projects.
pub fn build(
    ctx: &mut BuildContext,
    shell: &Shell,
    runner: &dyn CommandRunner,
    opts: &BuildOptions,
) -> Result<BuildSummary> {
    let started = Instant::now();
    let modules = resolve_project(&ctx.sdk, &ctx.project, ctx.platform)?;
    let deps = &modules.deps;
    shell.status(
        Status::Resolving,
        format!("{} modules for {}", deps.len(), ctx.platform),
    );
    for name in deps.missing() {
        shell.status(Status::Skipped, format!("unknown module `{}`", name));
    }

    let mut summary = BuildSummary {
        modules: deps.names().into_iter().map(str::to_string).collect(),
        unknown_modules: deps.missing().to_vec(),
        ..BuildSummary::default()
    };

    // Framework names across every architecture, for the Xcode projects.
    let mut required_names: Vec<String> = Vec::new();
    let mut managed_names: BTreeSet<String> = BTreeSet::new();

    for sub in ctx.sub_projects() {
        for cpu in ctx.cpu_list(&sub) {
            let Some(arch) = ctx.layout.arch_token(ctx.platform, &cpu, ctx.profile) else {
                shell.warn(format!(
                    "no {} libraries for `{}` (known: {})",
                    ctx.platform,
                    cpu,
                    ctx.layout.known_cpus(ctx.platform).join(", ")
                ));
                continue;
            };
            let destinations =
                ctx.layout
                    .destinations(ctx.platform, &cpu, ctx.project.root(), &sub);
            let locator = ArchitectureLibraryLocator::new(
                ctx.platform,
                arch,
                ctx.profile.as_str(),
                &destinations,
            );

            let required = locator.locate(deps.iter(), &mut ctx.not_found)?;
            let all = locator.locate_all(&modules.store);
            tracing::debug!("{} {}: using SDK libraries for {}", sub, cpu, arch);

            collect_names(&required, &mut required_names);
            managed_names.extend(all.file_names().map(str::to_string));

            let plan = SyncPlan::compute(&required, &all, ctx.clear_lib)
                .with_context(|| format!("failed to plan libraries for {} ({})", sub, cpu))?;
            if ctx.dry_run {
                print_sync_plan(shell, ctx.project.root(), &plan);
            } else {
                let report = execute_sync(shell, ctx.project.root(), &plan)?;
                accumulate(&mut summary.sync, report);
            }
            summary.plans.push(plan);
        }
    }

    if ctx.platform.is_ios() {
        let kind = ProjectKind::for_file_type(ctx.file_type);
        required_names.retain(|n| n.ends_with(".xcframework"));
        let engine = PbxprojSpliceEngine::new(kind, &required_names, &managed_names)
            .with_remove_unused(ctx.clear_lib);

        for path in ctx.project.pbxproj_files(ctx.file_type)? {
            if !ctx.dry_run {
                shell.status(
                    Status::Splicing,
                    relative_path(ctx.project.root(), &path).display(),
                );
            }
            let report = engine.update_project(&path, ctx.dry_run)?;
            report_splice(shell, ctx.project.root(), &path, &report, ctx.dry_run);
            summary.splices.push((path, report));
        }
    }

    summary.missing_libraries = ctx.not_found.missing().to_vec();

    if opts.icu {
        let api_version = opts.api_version.or_else(|| ctx.project.sdk_api_version());
        summary.icu = package_icu(ctx, shell, runner, deps, api_version)?;
    }

    if !ctx.dry_run {
        shell.status(
            Status::Finished,
            format!(
                "{} libraries for {} ({}), {} unchanged, {} removed in {}",
                summary.sync.libraries_copied,
                ctx.file_type,
                ctx.profile,
                summary.sync.files_unchanged,
                summary.sync.removed,
                format_duration(started.elapsed())
            ),
        );
    }

    Ok(summary)
}

/// Plan and (unless dry-running) carry out ICU data handling.
///
/// Returns `None` for a dry run.
pub(crate) fn package_icu(
    ctx: &BuildContext,
    shell: &Shell,
    runner: &dyn CommandRunner,
    deps: &ResolvedDependencySet,
    api_version: Option<u32>,
) -> Result<Option<IcuOutcome>> {
    let bridge = IcuDataFilterBridge::new(&ctx.sdk, &ctx.project, runner);
    let plan = bridge.plan(deps, ctx.file_type, api_version);
    let root = ctx.project.root();

    if ctx.dry_run {
        match &plan {
            IcuPlan::Skip { reason } => {
                shell.status(Status::Skipped, format!("ICU data: {}", reason))
            }
            IcuPlan::CopyFull { dest, reason, .. } => shell.status(
                Status::Planned,
                format!("copy full ICU data to {} ({})", relative_path(root, dest).display(), reason),
            ),
            IcuPlan::Trim { dest, locales, .. } => shell.status(
                Status::Planned,
                format!(
                    "trim ICU data to {} into {}",
                    locales.join(", "),
                    relative_path(root, dest).display()
                ),
            ),
        }
        return Ok(None);
    }

    if let IcuPlan::Trim { locales, .. } = &plan {
        shell.status(Status::Trimming, format!("ICU data to {}", locales.join(", ")));
    }
    let outcome = bridge.execute(plan)?;
    match &outcome {
        IcuOutcome::Skipped { reason } => tracing::debug!("ICU data skipped: {}", reason),
        IcuOutcome::Copied { dest, .. } => shell.status(
            Status::Copied,
            format!("ICU data to {}", relative_path(root, dest).display()),
        ),
        IcuOutcome::Trimmed { dest, .. } => shell.status(
            Status::Updated,
            format!("trimmed ICU data in {}", relative_path(root, dest).display()),
        ),
    }
    Ok(Some(outcome))
}

fn collect_names(map: &LibraryMap, names: &mut Vec<String>) {
    for name in map.file_names() {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
}

fn execute_sync(shell: &Shell, root: &Path, plan: &SyncPlan) -> Result<SyncReport> {
    let pending = plan.copies.iter().filter(|c| !c.is_up_to_date()).count();
    let progress = shell.progress(pending as u64, "Copying libraries");
    for op in plan.copies.iter().filter(|c| !c.is_up_to_date()) {
        progress.println(
            shell,
            Status::Copying,
            format!("{} ({})", relative_path(root, &op.dest).display(), op.module),
        );
    }
    let report = plan.execute(Some(&progress))?;
    progress.finish();

    for path in &plan.removals {
        if !path.exists() {
            shell.status(Status::Removed, relative_path(root, path).display());
        }
    }
    for path in &plan.unused_kept {
        shell.status(Status::Unused, relative_path(root, path).display());
    }
    Ok(report)
}

fn print_sync_plan(shell: &Shell, root: &Path, plan: &SyncPlan) {
    for dir in &plan.create_dirs {
        shell.status(
            Status::Planned,
            format!("create {}", relative_path(root, dir).display()),
        );
    }
    for op in &plan.copies {
        if op.is_up_to_date() {
            continue;
        }
        shell.status(
            Status::Planned,
            format!(
                "copy {} to {} ({} files)",
                op.module,
                relative_path(root, &op.dest).display(),
                op.files.len()
            ),
        );
        for path in &op.stale {
            shell.status(
                Status::Planned,
                format!("remove {}", relative_path(root, path).display()),
            );
        }
    }
    for path in &plan.removals {
        shell.status(
            Status::Planned,
            format!("remove {}", relative_path(root, path).display()),
        );
    }
    for path in &plan.unused_kept {
        shell.status(Status::Unused, relative_path(root, path).display());
    }
}

fn report_splice(shell: &Shell, root: &Path, path: &Path, report: &SpliceReport, dry_run: bool) {
    let display = relative_path(root, path);
    if dry_run {
        for (section, lib) in &report.added {
            shell.status(
                Status::Planned,
                format!("add {} to {} in {}", lib, section, display.display()),
            );
        }
        for (section, lib) in &report.removed {
            shell.status(
                Status::Planned,
                format!("drop {} from {} in {}", lib, section, display.display()),
            );
        }
    } else if report.changed {
        shell.status(
            Status::Updated,
            format!(
                "{} (+{} -{} frameworks)",
                display.display(),
                report.added_libraries().len(),
                report.removed_libraries().len()
            ),
        );
    }
}

fn accumulate(total: &mut SyncReport, report: SyncReport) {
    total.libraries_copied += report.libraries_copied;
    total.files_written += report.files_written;
    total.files_unchanged += report.files_unchanged;
    total.removed += report.removed;
    total.removal_failures += report.removal_failures;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::context::{NotFoundAction, NotFoundHandler};
    use crate::core::platform::{BuildProfile, FileType};
    use crate::core::project::Project;
    use crate::core::sdk::Sdk;
    use crate::test_support::{MockExecutor, ProjectFixture, SdkFixture};
    use crate::util::shell::{ColorChoice, Verbosity};
    use std::fs;
    use tempfile::TempDir;

    struct Setup {
        _tmp: TempDir,
        sdk: Sdk,
        project: Project,
    }

    fn setup(project: impl FnOnce(ProjectFixture) -> ProjectFixture) -> Setup {
        let tmp = TempDir::new().unwrap();
        let sdk = SdkFixture::new(tmp.path().join("sdk")).write().unwrap();
        let project = project(ProjectFixture::new(tmp.path().join("proj")))
            .write()
            .unwrap();
        Setup {
            _tmp: tmp,
            sdk,
            project,
        }
    }

    fn quiet() -> Shell {
        Shell::new(Verbosity::Quiet, ColorChoice::Never)
    }

    fn context(s: &Setup, file_type: FileType) -> BuildContext {
        BuildContext::new(s.sdk.clone(), s.project.clone(), file_type, false)
    }

    fn no_icu() -> BuildOptions {
        BuildOptions {
            icu: false,
            api_version: None,
        }
    }

    #[test]
    fn test_apk_build_copies_required_libraries() {
        let s = setup(|p| p.with_modules(&["plugin.web"]).with_abi_filters(&["arm64-v8a", "armeabi-v7a"]));
        let mut ctx = context(&s, FileType::Apk);
        let summary = build(&mut ctx, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();

        assert_eq!(summary.modules, ["engine/arkui", "plugin.web", "plugin.bridge"]);
        let libs = s.project.android_dir().join("app/libs");
        for abi in ["arm64-v8a", "armeabi-v7a"] {
            for lib in ["libarkui_android.so", "libweb.so", "libbridge.so"] {
                assert!(libs.join(abi).join(lib).is_file(), "{}/{}", abi, lib);
            }
            assert!(!libs.join(abi).join("libi18n.so").exists());
        }
        assert!(libs.join("arkui_android_adapter.jar").is_file());
        assert!(libs.join("web_adapter.jar").is_file());
        assert!(!libs.join("x86_64").exists());
    }

    #[test]
    fn test_second_build_is_a_no_op() {
        let s = setup(|p| p.with_modules(&["plugin.i18n"]));
        let mut ctx = context(&s, FileType::Apk);
        build(&mut ctx, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();

        let mut again = context(&s, FileType::Apk);
        let summary = build(&mut again, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();
        assert_eq!(summary.sync.files_written, 0);
        assert!(summary.plans.iter().all(SyncPlan::is_empty));
    }

    #[test]
    fn test_clear_lib_removes_unused_libraries() {
        let s = setup(|p| p.with_modules(&["plugin.web"]));
        let mut ctx = context(&s, FileType::Apk);
        build(&mut ctx, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();

        let arm64 = s.project.android_dir().join("app/libs/arm64-v8a");
        fs::write(arm64.join("libcustom.so"), "mine").unwrap();
        fs::remove_dir_all(s.project.root().join("entry/build")).unwrap();

        let mut keep = context(&s, FileType::Apk);
        let summary = build(&mut keep, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();
        assert_eq!(summary.sync.removed, 0);
        assert!(arm64.join("libweb.so").exists());

        let mut clear = context(&s, FileType::Apk).with_clear_lib(true);
        let summary = build(&mut clear, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();
        assert_eq!(summary.sync.removed, 3);
        assert!(!arm64.join("libweb.so").exists());
        assert!(!arm64.join("libbridge.so").exists());
        assert!(!s.project.android_dir().join("app/libs/web_adapter.jar").exists());
        assert!(arm64.join("libarkui_android.so").exists());
        assert!(arm64.join("libcustom.so").exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let s = setup(|p| p.with_modules(&["plugin.web"]));
        let before = fs::read_to_string(s.project.app_pbxproj()).unwrap();
        let mut ctx = context(&s, FileType::Ios).with_dry_run(true);
        let shell = Shell::capturing(Verbosity::Normal);
        let summary = build(&mut ctx, &shell, &MockExecutor::new(), &no_icu()).unwrap();

        let lines = shell.captured();
        assert!(lines.iter().any(|l| l.contains("Would copy plugin.web")));
        assert!(lines
            .iter()
            .any(|l| l.contains("Would add libweb.xcframework to PBXBuildFile")));
        assert!(!lines.iter().any(|l| l.contains("Finished")));
        assert!(!summary.plans.is_empty());
        assert!(!s.project.native_dir().join("ios/frameworks").exists());
        assert_eq!(fs::read_to_string(s.project.app_pbxproj()).unwrap(), before);
        assert!(summary.splices[0].1.changed);
    }

    #[test]
    fn test_ios_build_splices_app_project() {
        let s = setup(|p| p.with_modules(&["plugin.web"]));
        let mut ctx = context(&s, FileType::Ios).with_profile(BuildProfile::Debug);
        let summary = build(&mut ctx, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();

        let frameworks = s.project.native_dir().join("ios/frameworks");
        assert!(frameworks.join("libweb.xcframework/Info.plist").is_file());
        assert!(frameworks.join("libbridge.xcframework/Info.plist").is_file());

        let text = fs::read_to_string(s.project.app_pbxproj()).unwrap();
        assert!(text.contains("libweb.xcframework in Embed Frameworks"));
        assert!(text.contains("libarkui_ios.xcframework in Embed Frameworks"));
        assert_eq!(summary.splices.len(), 1);

        let mut again = context(&s, FileType::Ios).with_profile(BuildProfile::Debug);
        let summary = build(&mut again, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();
        assert!(!summary.splices[0].1.changed);
    }

    #[test]
    fn test_ios_references_follow_clear_lib() {
        let s = setup(|p| p.with_modules(&["plugin.web"]));
        build(&mut context(&s, FileType::Ios), &quiet(), &MockExecutor::new(), &no_icu()).unwrap();
        fs::remove_dir_all(s.project.root().join("entry/build")).unwrap();
        let frameworks = s.project.native_dir().join("ios/frameworks");

        let mut keep = context(&s, FileType::Ios);
        build(&mut keep, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();
        assert!(frameworks.join("libweb.xcframework").exists());
        let text = fs::read_to_string(s.project.app_pbxproj()).unwrap();
        assert!(text.contains("libweb.xcframework in Frameworks"));

        let mut clear = context(&s, FileType::Ios).with_clear_lib(true);
        build(&mut clear, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();
        assert!(!frameworks.join("libweb.xcframework").exists());
        let text = fs::read_to_string(s.project.app_pbxproj()).unwrap();
        assert!(!text.contains("libweb.xcframework"));
        assert!(text.contains("libarkui_ios.xcframework in Frameworks"));
    }

    #[test]
    fn test_framework_build_splices_every_project() {
        let s = setup(|p| p.with_modules(&["plugin.web"]).with_framework("mylib"));
        let mut ctx = context(&s, FileType::IosFramework);
        let summary = build(&mut ctx, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();

        assert_eq!(summary.splices.len(), 2);
        let mylib = fs::read_to_string(
            s.project.native_dir().join("ios/mylib.xcodeproj/project.pbxproj"),
        )
        .unwrap();
        assert!(mylib.contains("path = ../frameworks/libweb.xcframework;"));
        assert!(!mylib.contains("in Embed Frameworks"));
    }

    #[test]
    fn test_missing_library_under_abort_fails() {
        let tmp = TempDir::new().unwrap();
        let sdk = SdkFixture::new(tmp.path().join("sdk"))
            .without_library("plugins/api/web/android-arm64-release/libweb.so")
            .write()
            .unwrap();
        let project = ProjectFixture::new(tmp.path().join("proj"))
            .with_modules(&["plugin.web"])
            .write()
            .unwrap();

        let mut ctx = BuildContext::new(sdk.clone(), project.clone(), FileType::Apk, false)
            .with_not_found(NotFoundHandler::fixed(NotFoundAction::Abort));
        let err = build(&mut ctx, &quiet(), &MockExecutor::new(), &no_icu()).unwrap_err();
        assert!(format!("{:#}", err).contains("libweb.so"));

        let mut ignore = BuildContext::new(sdk, project.clone(), FileType::Apk, false);
        let summary = build(&mut ignore, &quiet(), &MockExecutor::new(), &no_icu()).unwrap();
        assert_eq!(summary.missing_libraries.len(), 1);
        assert!(project
            .android_dir()
            .join("app/libs/arm64-v8a/libbridge.so")
            .is_file());
    }

    #[test]
    fn test_icu_data_follows_build() {
        let s = setup(|p| p.with_modules(&["plugin.i18n"]));
        let mut ctx = context(&s, FileType::Apk);
        let opts = BuildOptions {
            icu: true,
            api_version: Some(18),
        };
        let summary = build(&mut ctx, &quiet(), &MockExecutor::new(), &opts).unwrap();

        // No resConfigs: every locale is kept.
        assert!(matches!(summary.icu, Some(IcuOutcome::Copied { .. })));
        assert!(s
            .project
            .android_dir()
            .join("app/src/main/assets/arkui-x/systemres/icudt74l.dat")
            .is_file());
    }

    #[test]
    fn test_aar_build_fills_every_library() {
        let s = setup(|p| p.with_modules(&["plugin.bridge"]).with_aar(&["core", "widgets"]).with_api_version(None));
        let mut ctx = context(&s, FileType::Aar);
        let opts = BuildOptions {
            icu: true,
            api_version: None,
        };
        let summary = build(&mut ctx, &quiet(), &MockExecutor::new(), &opts).unwrap();

        assert_eq!(summary.plans.len(), 2);
        for sub in ["core", "widgets"] {
            let libs = s.project.android_dir().join(sub).join("libs");
            assert!(libs.join("arm64-v8a/libbridge.so").is_file(), "{}", sub);
            assert!(libs.join("arkui_android_adapter.jar").is_file(), "{}", sub);
        }
        assert!(!s.project.android_dir().join("app").exists());
        // No API level anywhere: ICU data is left alone.
        assert!(matches!(summary.icu, Some(IcuOutcome::Skipped { .. })));
    }

    #[test]
    fn test_unsupported_locale_ships_full_icu_data() {
        let s = setup(|p| {
            p.with_modules(&["plugin.i18n"])
                .with_res_configs("resConfigs \"en\", \"xh\"")
        });
        let mut ctx = context(&s, FileType::Apk);
        let opts = BuildOptions {
            icu: true,
            api_version: None,
        };
        let summary = build(&mut ctx, &quiet(), &MockExecutor::new(), &opts).unwrap();

        match summary.icu {
            Some(IcuOutcome::Copied { reason, .. }) => assert!(reason.contains("xh"), "{}", reason),
            other => panic!("expected a full copy, got {:?}", other),
        }
    }

    #[test]
    fn test_harmony_project_gets_icu_data() {
        let s = setup(|p| {
            p.with_harmony_version()
                .with_modules(&["plugin.i18n"])
                .with_res_configs("resConfigs \"en\", \"xh\"")
        });
        let mut ctx = context(&s, FileType::Apk);
        let opts = BuildOptions {
            icu: true,
            api_version: None,
        };
        let summary = build(&mut ctx, &quiet(), &MockExecutor::new(), &opts).unwrap();

        match summary.icu {
            Some(IcuOutcome::Copied { dest, .. }) => assert!(dest.is_file()),
            other => panic!("expected ICU data for API 18, got {:?}", other),
        }
    }

    #[test]
    fn test_ios_icu_reads_known_regions() {
        let s = setup(|p| {
            p.with_modules(&["plugin.intl"])
                .with_known_regions(&["en", "Base", "tlh"])
        });
        let mut ctx = context(&s, FileType::Ios);
        let opts = BuildOptions {
            icu: true,
            api_version: Some(18),
        };
        let summary = build(&mut ctx, &quiet(), &MockExecutor::new(), &opts).unwrap();

        match summary.icu {
            Some(IcuOutcome::Copied { dest, reason }) => {
                assert!(reason.contains("tlh"), "{}", reason);
                assert_eq!(dest, s.project.ios_dir().join("arkui-x/systemres/icudt74l.dat"));
                assert!(dest.is_file());
            }
            other => panic!("expected a full copy, got {:?}", other),
        }
    }

    #[test]
    fn test_sdk_without_icu_data_skips_it() {
        let tmp = TempDir::new().unwrap();
        let sdk = SdkFixture::new(tmp.path().join("sdk"))
            .without_icu_data()
            .write()
            .unwrap();
        let project = ProjectFixture::new(tmp.path().join("proj"))
            .with_modules(&["plugin.i18n"])
            .write()
            .unwrap();

        let mut ctx = BuildContext::new(sdk, project, FileType::Apk, false);
        let opts = BuildOptions {
            icu: true,
            api_version: Some(18),
        };
        let summary = build(&mut ctx, &quiet(), &MockExecutor::new(), &opts).unwrap();
        assert!(matches!(
            summary.icu,
            Some(IcuOutcome::Skipped { ref reason }) if reason.contains("no ICU data")
        ));
    }
}
