use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use walkdir::WalkDir;

use super::*;
use crate::domain::{FixedClock, PartitionKey};
use crate::storage::{PendingCommit, Site, MANIFEST_FILE};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn setup_site() -> (TempDir, Site) {
    let dir = TempDir::new().unwrap();
    let site = Site::init(dir.path()).unwrap();
    (dir, site)
}

fn add_flat(site: &Site, name: &str, body: &str) -> PathBuf {
    let path = site.tank_dir().join(format!("{}.txt", name));
    fs::write(&path, body).unwrap();
    path
}

fn run_at(site: &Site, now: DateTime<Utc>) -> PublishReport {
    Publisher::new(site, FixedClock(now)).unwrap().run().unwrap()
}

/// Every file under `root` with its contents
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn partition_manifest(site: &Site, ts: DateTime<Utc>) -> crate::domain::Manifest {
    site.manifests()
        .read_partition(&PartitionKey::for_timestamp(ts))
        .unwrap()
}

#[test]
fn first_run_backfills_from_start() {
    let (_dir, site) = setup_site();
    let draft = add_flat(&site, "hello-world", "Hi.");

    let report = run_at(&site, at(2024, 12, 1, 0, 0, 1));

    assert_eq!(report.outcome, Outcome::Published);
    assert_eq!(report.due, 1);
    assert_eq!(report.published.len(), 1);
    assert_eq!(report.published[0].date, "2024-12-01T00:00:00Z");
    assert_eq!(
        report.published[0].url,
        "/blog/blog-posts/.posted/2024-12-december/hello-world/"
    );
    assert!(!draft.exists());
    assert_eq!(site.state().load().unwrap(), Some(at(2024, 12, 1, 0, 0, 0)));
    assert_eq!(
        report.summary(),
        "Published 1 post(s). Next due after 2024-12-01T12:00:00Z."
    );

    let page = site
        .posted_dir()
        .join("2024-12-december/hello-world/index.html");
    let html = fs::read_to_string(page).unwrap();
    assert!(html.contains("<h1>Hello World</h1>"));
    assert!(html.contains("<p>Hi.</p>"));
    assert!(html.contains("2024-12-01T00:00:00Z"));
}

#[test]
fn empty_tank_is_noop() {
    let (_dir, site) = setup_site();
    let last = at(2025, 1, 1, 0, 0, 0);
    site.state().save(last).unwrap();
    let before = snapshot(site.root());

    let report = run_at(&site, at(2025, 1, 2, 12, 0, 0));

    assert_eq!(report.due, 3);
    assert_eq!(report.outcome, Outcome::EmptyTank);
    assert_eq!(site.state().load().unwrap(), Some(last));
    assert_eq!(snapshot(site.root()), before);
}

#[test]
fn publishes_only_due_count_in_sorted_order() {
    let (_dir, site) = setup_site();
    for name in ["e", "c", "a", "d", "b"] {
        add_flat(&site, name, name);
    }
    let last = at(2025, 2, 1, 0, 0, 0);
    site.state().save(last).unwrap();

    let report = run_at(&site, at(2025, 2, 2, 0, 0, 0));

    assert_eq!(report.due, 2);
    let titles: Vec<_> = report.published.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B"]);

    let remaining: Vec<_> = site
        .tank()
        .list()
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(remaining, vec!["c.txt", "d.txt", "e.txt"]);
    assert_eq!(site.state().load().unwrap(), Some(at(2025, 2, 2, 0, 0, 0)));
}

#[test]
fn never_publishes_more_than_available() {
    let (_dir, site) = setup_site();
    add_flat(&site, "only", "x");
    site.state().save(at(2025, 2, 1, 0, 0, 0)).unwrap();

    let report = run_at(&site, at(2025, 2, 5, 0, 0, 0));

    assert_eq!(report.due, 8);
    assert_eq!(report.published.len(), 1);
    assert_eq!(site.state().load().unwrap(), Some(at(2025, 2, 1, 12, 0, 0)));
}

#[test]
fn second_immediate_run_changes_nothing() {
    let (_dir, site) = setup_site();
    add_flat(&site, "one", "1");
    add_flat(&site, "two", "2");
    let now = at(2024, 12, 1, 6, 0, 0);

    run_at(&site, now);
    let before = snapshot(site.root());

    let report = run_at(&site, now);

    assert_eq!(report.outcome, Outcome::NoSlotsDue);
    assert_eq!(report.summary(), "No slots due.");
    assert_eq!(snapshot(site.root()), before);
}

#[test]
fn draft_consumed_once_with_single_manifest_entry() {
    let (_dir, site) = setup_site();
    let draft = add_flat(&site, "once", "x");
    let now = at(2024, 12, 1, 0, 0, 0);

    run_at(&site, now);

    assert!(!draft.exists());
    let manifest = partition_manifest(&site, now);
    let hits = manifest
        .posts
        .iter()
        .filter(|p| p.url.ends_with("/once/"))
        .count();
    assert_eq!(hits, 1);
}

#[test]
fn republishing_slug_in_same_partition_replaces_entry() {
    let (_dir, site) = setup_site();
    add_flat(&site, "repeat", "Title: First Take\n\nold");
    run_at(&site, at(2024, 12, 1, 0, 0, 0));

    add_flat(&site, "repeat", "Title: Second Take\n\nnew");
    run_at(&site, at(2024, 12, 1, 12, 0, 0));

    let manifest = partition_manifest(&site, at(2024, 12, 1, 0, 0, 0));
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.posts[0].title, "Second Take");
    assert_eq!(manifest.posts[0].date, "2024-12-01T12:00:00Z");

    let root = site.manifests().read_root().unwrap();
    assert_eq!(root.len(), 1);
}

#[test]
fn slots_split_across_month_partitions() {
    let (_dir, site) = setup_site();
    add_flat(&site, "late-december", "x");
    add_flat(&site, "new-year", "y");
    site.state().save(at(2024, 12, 31, 0, 0, 0)).unwrap();

    run_at(&site, at(2025, 1, 1, 0, 0, 0));

    let dec = partition_manifest(&site, at(2024, 12, 1, 0, 0, 0));
    let jan = partition_manifest(&site, at(2025, 1, 1, 0, 0, 0));
    assert_eq!(dec.posts[0].date, "2024-12-31T12:00:00Z");
    assert_eq!(jan.posts[0].date, "2025-01-01T00:00:00Z");

    let root = site.manifests().read_root().unwrap();
    let dates: Vec<_> = root.posts.iter().map(|p| p.date.as_str()).collect();
    assert_eq!(dates, vec!["2025-01-01T00:00:00Z", "2024-12-31T12:00:00Z"]);
    assert!(site
        .posted_dir()
        .join("2025-01-january")
        .join(MANIFEST_FILE)
        .is_file());
}

#[test]
fn unreadable_draft_does_not_consume_slot() {
    let (_dir, site) = setup_site();
    let bad = site.tank_dir().join("a-broken.txt");
    fs::write(&bad, [0xff, 0xfe, 0x80]).unwrap();
    add_flat(&site, "b-good", "fine");
    site.state().save(at(2025, 3, 1, 0, 0, 0)).unwrap();

    let report = run_at(&site, at(2025, 3, 1, 12, 0, 0));

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, bad);
    assert_eq!(report.published.len(), 1);
    assert_eq!(report.published[0].date, "2025-03-01T12:00:00Z");
    assert!(bad.exists());
    assert_eq!(site.state().load().unwrap(), Some(at(2025, 3, 1, 12, 0, 0)));
}

#[test]
fn all_drafts_unreadable_leaves_state_alone() {
    let (_dir, site) = setup_site();
    fs::write(site.tank_dir().join("broken.txt"), [0xff]).unwrap();
    let last = at(2025, 3, 1, 0, 0, 0);
    site.state().save(last).unwrap();

    let report = run_at(&site, at(2025, 3, 2, 0, 0, 0));

    assert!(report.published.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(site.state().load().unwrap(), Some(last));
    assert!(!site.manifests().root_manifest_path().exists());
}

#[test]
fn bundle_assets_are_copied() {
    let (_dir, site) = setup_site();
    let bundle = site.tank_dir().join("Gallery-Post");
    fs::create_dir_all(bundle.join("img")).unwrap();
    fs::write(bundle.join("content.txt"), "Look at this.").unwrap();
    fs::write(bundle.join("img/photo.jpg"), "jpeg").unwrap();

    run_at(&site, at(2024, 12, 1, 0, 0, 0));

    let out = site.posted_dir().join("2024-12-december/gallery-post");
    assert!(out.join("index.html").is_file());
    assert!(out.join("img/photo.jpg").is_file());
    assert!(!out.join("content.txt").exists());
    assert!(!bundle.exists());
}

#[test]
fn full_document_date_placeholder_is_resolved() {
    let (_dir, site) = setup_site();
    let bundle = site.tank_dir().join("handmade");
    fs::create_dir_all(&bundle).unwrap();
    fs::write(
        bundle.join("index.html"),
        "<html><head><title>Handmade Page</title></head><body>DATE_PLACEHOLDER</body></html>",
    )
    .unwrap();

    let report = run_at(&site, at(2024, 12, 1, 0, 0, 0));

    assert_eq!(report.published[0].title, "Handmade Page");
    let html = fs::read_to_string(
        site.posted_dir()
            .join("2024-12-december/handmade/index.html"),
    )
    .unwrap();
    assert_eq!(
        html,
        "<html><head><title>Handmade Page</title></head><body>2024-12-01T00:00:00Z</body></html>"
    );
}

#[test]
fn custom_template_is_used() {
    let (_dir, site) = setup_site();
    let tpl = site.resolve(&site.config().paths.template);
    fs::create_dir_all(tpl.parent().unwrap()).unwrap();
    fs::write(&tpl, "[{{TITLE}}|{{DATE}}]{{CONTENT}}").unwrap();
    add_flat(&site, "templated", "body");

    run_at(&site, at(2024, 12, 1, 0, 0, 0));

    let html = fs::read_to_string(
        site.posted_dir()
            .join("2024-12-december/templated/index.html"),
    )
    .unwrap();
    assert_eq!(html, "[Templated|2024-12-01T00:00:00Z]<p>body</p>");
}

#[test]
fn interrupted_run_is_finished_not_repeated() {
    let (_dir, site) = setup_site();
    let last = at(2025, 4, 1, 0, 0, 0);
    site.state().save(last).unwrap();

    // Simulate a run that wrote the page and manifest, journaled the commit,
    // then died before removing the draft and saving state.
    let slot = at(2025, 4, 1, 12, 0, 0);
    let stray = add_flat(&site, "stray", "x");
    let partition = PartitionKey::for_timestamp(slot);
    let url = format!("/blog/blog-posts/.posted/{}/stray/", partition);
    site.manifests()
        .upsert(
            &partition,
            crate::domain::ManifestEntry {
                title: "Stray".into(),
                url: url.clone(),
                description: "Stray".into(),
                date: "2025-04-01T12:00:00Z".into(),
                tags: vec![],
                image: None,
                extra: Default::default(),
            },
        )
        .unwrap();
    site.journal()
        .record(PendingCommit {
            slug: crate::domain::Slug::from_name("stray").unwrap(),
            draft: stray.clone(),
            url,
            slot,
        })
        .unwrap();
    let next = add_flat(&site, "waiting", "y");

    let report = run_at(&site, at(2025, 4, 1, 12, 0, 1));

    let recovery = report.recovery.expect("journal should be replayed");
    assert_eq!(recovery.commits, 1);
    assert_eq!(recovery.drafts_removed, 1);
    assert!(!stray.exists());
    assert_eq!(report.outcome, Outcome::NoSlotsDue);
    assert!(next.exists());
    assert_eq!(site.state().load().unwrap(), Some(slot));
    assert!(!site.journal().path().exists());
    assert_eq!(site.manifests().read_root().unwrap().len(), 1);
}

#[test]
fn plan_has_no_side_effects() {
    let (_dir, site) = setup_site();
    add_flat(&site, "a", "1");
    add_flat(&site, "b", "2");
    add_flat(&site, "c", "3");
    let before = snapshot(site.root());

    let plan = Publisher::new(&site, FixedClock(at(2024, 12, 1, 12, 0, 0)))
        .unwrap()
        .plan()
        .unwrap();

    assert!(plan.seeded);
    assert_eq!(plan.due, 2);
    assert_eq!(plan.drafts, 3);
    assert_eq!(plan.slots.len(), 2);
    assert_eq!(plan.slots[0].slot, at(2024, 12, 1, 0, 0, 0));
    assert_eq!(plan.slots[1].slot, at(2024, 12, 1, 12, 0, 0));
    assert_eq!(plan.next_due, at(2024, 12, 1, 0, 0, 0));
    assert_eq!(snapshot(site.root()), before);
}

#[test]
fn corrupt_state_reseeds_backfill() {
    let (_dir, site) = setup_site();
    fs::write(site.state().path(), "not json").unwrap();
    add_flat(&site, "fresh", "x");

    let report = run_at(&site, at(2024, 12, 1, 0, 0, 0));

    assert_eq!(report.published[0].date, "2024-12-01T00:00:00Z");
    assert_eq!(site.state().load().unwrap(), Some(at(2024, 12, 1, 0, 0, 0)));
}

#[test]
fn oversized_interval_is_an_error_not_a_panic() {
    let (dir, _) = setup_site();
    let mut config = crate::storage::Config::default();
    config.schedule.interval_hours = u32::MAX;
    let site = Site::with_config(dir.path(), config);
    add_flat(&site, "never", "x");

    assert!(Publisher::new(&site, FixedClock(at(2025, 1, 1, 0, 0, 0))).is_err());
}

#[test]
fn draft_name_with_spaces_gets_hyphenated_url() {
    let (_dir, site) = setup_site();
    add_flat(&site, "My Post", "Body.");

    let report = run_at(&site, at(2024, 12, 1, 0, 0, 0));

    assert_eq!(report.published[0].title, "My Post");
    assert_eq!(
        report.published[0].url,
        "/blog/blog-posts/.posted/2024-12-december/my-post/"
    );
    assert!(site
        .posted_dir()
        .join("2024-12-december/my-post/index.html")
        .is_file());
}
