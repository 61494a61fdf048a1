//! Image install / redeploy / delete flows, fully offline
//!
//! Every test drives the real orchestrator against zip fixtures built on
//! the spot; no network, no git binary.

mod common;

use brokkr_clones::{deploy, install, Error, ImageInstallOpts};
use common::{make_image_archive, test_home};

#[tokio::test]
async fn image_install_deploys_full_tree_and_registers() {
    let home = test_home();
    let archive = make_image_archive(home.paths.home(), "brokkr-main", true);

    let clone = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "dev".into(),
            source: Some(archive.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(clone.is_image_deployed());
    assert!(clone.path().join("brokkrlib").is_dir());
    assert_eq!(clone.module_version(), "4.8.12");

    // Engines survive the copy and resolve
    let engines = clone.engines().unwrap();
    assert_eq!(engines.len(), 1);
    assert_eq!(engines[0].version, 273);
    assert!(engines[0].runtime);

    // Redeploy metadata was recorded at the destination
    let args = deploy::read_args(clone.path()).unwrap();
    assert_eq!(args.source, archive.to_string());
    assert_eq!(args.deployment, None);

    // The staging directory is gone
    assert!(!home.paths.stage_dir("dev").exists());

    // And the registry knows the clone
    let listed = home.registry.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name(), "dev");
}

#[tokio::test]
async fn image_install_copies_only_the_requested_deployment() {
    let home = test_home();
    let work = home.paths.home();

    // Image with a manifest declaring a subset, plus a directory outside it
    let tree = work.join("image-src/brokkr-main");
    common::make_clone_tree(&tree);
    std::fs::create_dir_all(tree.join("extras")).unwrap();
    std::fs::write(tree.join("extras/big.bin"), b"payload").unwrap();
    std::fs::write(
        tree.join("Brokkrfile"),
        "[deployments]\ncore = [\"brokkrlib\", \"bin\"]\n",
    )
    .unwrap();
    let archive = work.join("image.zip");
    common::zip_dir(&work.join("image-src"), &archive);

    let clone = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "lean".into(),
            source: Some(archive.to_string()),
            deployment: Some("core".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(clone.path().join("brokkrlib").is_dir());
    assert!(clone.path().join("bin/engines/273").is_dir());
    assert!(!clone.path().join("extras").exists());
    assert_eq!(
        deploy::read_args(clone.path()).unwrap().deployment,
        Some("core".into())
    );
}

#[tokio::test]
async fn unknown_deployment_fails_and_cleans_up() {
    let home = test_home();
    let archive = make_image_archive(home.paths.home(), "brokkr-main", true);

    let result = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "dev".into(),
            source: Some(archive.to_string()),
            deployment: Some("nope".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(Error::NotFound { .. })));

    assert!(!home.paths.clones_dir().join("dev").exists());
    assert!(!home.paths.stage_dir("dev").exists());
    assert!(home.registry.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_image_leaves_no_partial_state() {
    let home = test_home();
    let archive = make_image_archive(home.paths.home(), "brokkr-main", false);

    let result = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "dev".into(),
            source: Some(archive.to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(Error::InvalidClone { .. })));

    // Compensating cleanup: no destination, no stage, nothing registered
    assert!(!home.paths.clones_dir().join("dev").exists());
    assert!(!home.paths.stage_dir("dev").exists());
    assert!(home.registry.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_image_source_is_a_hard_failure() {
    let home = test_home();
    let result = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "dev".into(),
            source: Some("/no/such/image.zip".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(Error::ResourceMissing { .. })));
}

#[tokio::test]
async fn redeploy_recreates_from_recorded_arguments() {
    let home = test_home();
    let archive = make_image_archive(home.paths.home(), "brokkr-main", true);

    let clone = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "dev".into(),
            source: Some(archive.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // Damage the deployment, then update (= redeploy for image clones)
    let marker = clone.path().join("brokkrlib/brokkr/version");
    std::fs::remove_file(&marker).unwrap();
    let redeployed = install::update(&home.registry, &home.paths, &clone)
        .await
        .unwrap();

    assert_eq!(redeployed.path(), clone.path());
    assert!(marker.is_file(), "redeploy restores the recorded image");
    assert_eq!(home.registry.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_install_name_fails_without_clobbering_the_original() {
    let home = test_home();
    let archive = make_image_archive(home.paths.home(), "brokkr-main", true);

    let first = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "dev".into(),
            source: Some(archive.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let second = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "dev".into(),
            source: Some(archive.to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(second, Err(Error::NameConflict { .. })));

    // The original deployment is intact and still registered
    assert!(first.path().join("brokkrlib").is_dir());
    assert_eq!(home.registry.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_removes_tree_and_registration() {
    let home = test_home();
    let archive = make_image_archive(home.paths.home(), "brokkr-main", true);

    let clone = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "dev".into(),
            source: Some(archive.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    install::delete(&home.registry, &clone, false).await.unwrap();
    assert!(!clone.path().exists());
    assert!(home.registry.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_with_clear_configs_wipes_the_store() {
    let home = test_home();
    let archive = make_image_archive(home.paths.home(), "brokkr-main", true);

    let clone = install::install_from_image(
        &home.registry,
        &home.paths,
        ImageInstallOpts {
            name: "dev".into(),
            source: Some(archive.to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    install::delete(&home.registry, &clone, true).await.unwrap();
    assert!(!home.paths.config_file().exists());
}
