//! Lambda code packaging and upload

use anyhow::Context;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use sutr_common::PublishProfile;

use crate::aws::LambdaApi;
use crate::config::Credentials;
use crate::output;

/// Runtimes offered when a new function is created
pub const RUNTIMES: &[&str] = &["nodejs20.x", "python3.12"];

pub const DEFAULT_RUNTIME: &str = "nodejs20.x";

/// Dependency directory shipped next to the handler code
const NODE_MODULES: &str = "node_modules";

/// Copy `source` and, when present, `node_modules` into `staging`.
///
/// The contents of `source` land at the staging root; `node_modules` keeps
/// its own directory name.
pub fn stage(source: &Path, node_modules: Option<&Path>, staging: &Path) -> anyhow::Result<u64> {
    if !source.is_dir() {
        anyhow::bail!("Lambda source directory not found: {}", source.display());
    }
    let mut count = copy_tree(source, staging)?;
    if let Some(modules) = node_modules.filter(|p| p.is_dir()) {
        count += copy_tree(modules, &staging.join(NODE_MODULES))?;
    }
    Ok(count)
}

fn copy_tree(from: &Path, to: &Path) -> anyhow::Result<u64> {
    let mut count = 0;
    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry?;
        let target = to.join(entry.path().strip_prefix(from)?);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to stage {}", entry.path().display()))?;
            count += 1;
        }
    }
    Ok(count)
}

/// Zip the contents of `dir` into `zip_path`
pub fn package(dir: &Path, zip_path: &Path) -> anyhow::Result<u64> {
    let file = File::create(zip_path)
        .with_context(|| format!("Failed to create {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let count = add_tree(&mut zip, dir, options)?;
    zip.finish()?;
    debug!("Packaged {} files into {}", count, zip_path.display());
    Ok(count)
}

fn add_tree(
    zip: &mut ZipWriter<File>,
    root: &Path,
    options: SimpleFileOptions,
) -> anyhow::Result<u64> {
    let mut count = 0;
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(root)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut source = File::open(entry.path())?;
            std::io::copy(&mut source, zip)?;
            count += 1;
        }
    }
    Ok(count)
}

/// Handler installed into newly created functions
pub fn starter_source(runtime: &str) -> (&'static str, &'static str) {
    if runtime.starts_with("python") {
        (
            "index.py",
            "def handler(event, context):\n    \
             return {\"version\": \"1.0\", \"response\": {\"shouldEndSession\": True}}\n",
        )
    } else {
        (
            "index.js",
            "exports.handler = async (event) => ({\n  \
             version: '1.0',\n  response: { shouldEndSession: true },\n});\n",
        )
    }
}

/// Zip holding only the starter handler
pub fn starter_package(runtime: &str, zip_path: &Path) -> anyhow::Result<()> {
    let (name, body) = starter_source(runtime);
    let mut zip = ZipWriter::new(File::create(zip_path)?);
    zip.start_file(name, SimpleFileOptions::default())?;
    zip.write_all(body.as_bytes())?;
    zip.finish()?;
    Ok(())
}

/// Function the profile deploys to, exactly as written in its endpoint
pub fn function_target(profile: &PublishProfile) -> Option<&str> {
    let endpoint = profile.endpoint.as_ref().filter(|_| profile.uses_lambda())?;
    let location = endpoint.location.trim();
    (!location.is_empty()).then_some(location)
}

/// Short function name of an ARN, for messages
pub fn display_name(target: &str) -> &str {
    match target.split_once(":function:") {
        Some((_, rest)) => rest.split(':').next().unwrap_or(rest),
        None => target,
    }
}

/// Package the profile's source directory and upload it
pub async fn deploy(
    aws: &dyn LambdaApi,
    profile: &PublishProfile,
    creds: &Credentials,
    project_dir: &Path,
) -> anyhow::Result<()> {
    let Some(target) = function_target(profile) else {
        output::print_comment(
            "Skipping publish of lambda.  The publish profile is not configured with a lambda function.",
        );
        return Ok(());
    };

    let workdir = tempfile::tempdir()?;
    let staging = workdir.path().join("package");
    let zip_path: PathBuf = workdir.path().join("lambda.zip");
    let node_modules = project_dir.join(NODE_MODULES);
    info!("Packaging {}", profile.source_directory.display());
    stage(&profile.source_directory, Some(&node_modules), &staging)?;
    package(&staging, &zip_path)?;

    aws.configure(creds).await?;
    aws.update_function_code(target, &zip_path).await?;
    output::print_success(&format!(
        "Successfully uploaded code to Lambda function \"{}\"",
        display_name(target)
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::fake::FakeLambda;
    use std::io::Read;
    use sutr_common::{EndpointDescriptor, EndpointType};
    use zip::ZipArchive;

    fn entries(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    #[test]
    fn test_stage_and_package_source_with_node_modules() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("lambda");
        std::fs::create_dir_all(source.join("lib")).unwrap();
        std::fs::write(source.join("index.js"), "exports.handler = 1;").unwrap();
        std::fs::write(source.join("lib/util.js"), "module.exports = {};").unwrap();
        let modules = tmp.path().join("node_modules");
        std::fs::create_dir_all(modules.join("left-pad")).unwrap();
        std::fs::write(modules.join("left-pad/index.js"), "").unwrap();

        let staging = tmp.path().join("staging");
        assert_eq!(stage(&source, Some(&modules), &staging).unwrap(), 3);
        let zip_path = tmp.path().join("out.zip");
        assert_eq!(package(&staging, &zip_path).unwrap(), 3);

        let names = entries(&zip_path);
        assert!(names.contains(&"index.js".to_string()));
        assert!(names.contains(&"lib/util.js".to_string()));
        assert!(names.contains(&"node_modules/left-pad/index.js".to_string()));

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut body = String::new();
        archive
            .by_name("index.js")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "exports.handler = 1;");
    }

    #[test]
    fn test_package_without_node_modules() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("lambda");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("index.js"), "").unwrap();

        let staging = tmp.path().join("staging");
        let missing = tmp.path().join("node_modules");
        assert_eq!(stage(&source, Some(&missing), &staging).unwrap(), 1);
        let zip_path = tmp.path().join("out.zip");
        package(&staging, &zip_path).unwrap();
        assert_eq!(entries(&zip_path), vec!["index.js".to_string()]);
    }

    #[test]
    fn test_missing_source_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let err = stage(&tmp.path().join("nope"), None, &tmp.path().join("staging")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_starter_package_matches_runtime() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = tmp.path().join("starter.zip");
        starter_package("python3.12", &zip_path).unwrap();
        assert_eq!(entries(&zip_path), vec!["index.py".to_string()]);
        starter_package(DEFAULT_RUNTIME, &zip_path).unwrap();
        assert_eq!(entries(&zip_path), vec!["index.js".to_string()]);
    }

    #[test]
    fn test_function_target_is_location_unchanged() {
        let mut profile = PublishProfile::from_json(
            r#"{
                "skillName": "Weather Helper",
                "skillInvocationName": "weather helper",
                "skillOutputDirectory": "./deployment/ask",
                "skillConfigFilePath": "./lambda/config.json"
            }"#,
        )
        .unwrap();
        assert_eq!(function_target(&profile), None);

        profile.endpoint = Some(EndpointDescriptor {
            kind: EndpointType::Lambda,
            location: "arn:aws:lambda:us-east-1:123:function:weather".into(),
        });
        assert_eq!(
            function_target(&profile),
            Some("arn:aws:lambda:us-east-1:123:function:weather")
        );

        profile.endpoint = Some(EndpointDescriptor {
            kind: EndpointType::Lambda,
            location: "arn:aws:lambda:eu-west-1:123:function:weather:live".into(),
        });
        assert_eq!(
            function_target(&profile),
            Some("arn:aws:lambda:eu-west-1:123:function:weather:live")
        );

        profile.endpoint = Some(EndpointDescriptor {
            kind: EndpointType::Https,
            location: "https://api.example.com".into(),
        });
        assert_eq!(function_target(&profile), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("arn:aws:lambda:us-east-1:123:function:weather"), "weather");
        assert_eq!(display_name("arn:aws:lambda:eu-west-1:123:function:weather:live"), "weather");
        assert_eq!(display_name("weather"), "weather");
    }

    fn creds() -> Credentials {
        Credentials {
            aws_access_key_id: Some("AKIA".into()),
            aws_secret_access_key: Some("s3cret".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_deploy_uploads_packaged_source() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("lambda")).unwrap();
        std::fs::write(tmp.path().join("lambda/index.js"), "").unwrap();
        std::fs::create_dir_all(tmp.path().join("node_modules/dep")).unwrap();
        std::fs::write(tmp.path().join("node_modules/dep/index.js"), "").unwrap();

        let mut profile = PublishProfile::from_json(
            r#"{
                "skillName": "Weather Helper",
                "skillInvocationName": "weather helper",
                "skillOutputDirectory": "./deployment/ask",
                "skillConfigFilePath": "./lambda/config.json",
                "endpoint": { "type": "lambda", "location": "arn:aws:lambda:us-east-1:1:function:weather" }
            }"#,
        )
        .unwrap();
        profile.resolve_paths(tmp.path());

        let aws = FakeLambda::default();
        deploy(&aws, &profile, &creds(), tmp.path()).await.unwrap();

        assert_eq!(
            aws.calls(),
            vec![
                "configure",
                "update-function-code arn:aws:lambda:us-east-1:1:function:weather"
            ]
        );
        let uploads = aws.uploads.lock().unwrap();
        assert!(uploads[0].contains(&"index.js".to_string()));
        assert!(uploads[0].contains(&"node_modules/dep/index.js".to_string()));
    }

    #[tokio::test]
    async fn test_deploy_keeps_qualified_arn() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("lambda")).unwrap();
        std::fs::write(tmp.path().join("lambda/index.js"), "").unwrap();

        let mut profile = PublishProfile::from_json(
            r#"{
                "skillName": "Weather Helper",
                "skillInvocationName": "weather helper",
                "skillOutputDirectory": "./deployment/ask",
                "skillConfigFilePath": "./lambda/config.json",
                "endpoint": { "type": "lambda", "location": "arn:aws:lambda:eu-west-1:123:function:weather:live" }
            }"#,
        )
        .unwrap();
        profile.resolve_paths(tmp.path());

        let aws = FakeLambda::default();
        deploy(&aws, &profile, &creds(), tmp.path()).await.unwrap();
        assert_eq!(
            aws.calls()[1],
            "update-function-code arn:aws:lambda:eu-west-1:123:function:weather:live"
        );
    }

    #[tokio::test]
    async fn test_deploy_skips_https_profile() {
        let profile = PublishProfile::from_json(
            r#"{
                "skillName": "Weather Helper",
                "skillInvocationName": "weather helper",
                "skillOutputDirectory": "./deployment/ask",
                "skillConfigFilePath": "./lambda/config.json",
                "endpoint": { "type": "https", "location": "https://api.example.com/skill" }
            }"#,
        )
        .unwrap();
        let aws = FakeLambda::default();
        deploy(&aws, &profile, &creds(), Path::new(".")).await.unwrap();
        assert!(aws.calls().is_empty());
    }
}
