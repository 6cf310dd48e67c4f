use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use tempdir::TempDir;

const DOCUMENT: &str = "SyncTeX Version:1\n\
    Input:1:/doc/a.tex\n\
    Output:pdf\n\
    Magnification:1000\n\
    Unit:65536\n\
    X Offset:0\n\
    Y Offset:0\n\
    Content:\n\
    {1\n\
    [1,4:10,20:100,60,0\n\
    (1,5:10,30:100,10,2\n\
    g1,5:10,30\n\
    k1,6:80,30:20\n\
    )\n\
    ]\n\
    }1\n\
    Postamble:\n\
    Count:5\n\
    Post scriptum:\n";

fn write_document(dir: &Path) {
    fs::write(dir.join("main.synctex"), DOCUMENT).unwrap();
}

#[test]
fn forward_search_prints_boxes() {
    let dir = TempDir::new("synctex-cli").unwrap();
    write_document(dir.path());

    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("code")
        .arg(dir.path().join("main.pdf"))
        .arg("/doc/a.tex")
        .arg("6")
        .arg("0");
    // One point is 65536 engine units and 72.27/72 big points.
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("NODE\t1\t9.96"))
        .stdout(predicate::str::contains("\t99.62"))
        .stdout(predicate::function(|out: &str| out.lines().count() == 1));
}

#[test]
fn backward_search_prints_lines() {
    let dir = TempDir::new("synctex-cli").unwrap();
    write_document(dir.path());
    let unit = 65536.0 / 65781.76;

    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("pdf")
        .arg(dir.path().join("main.pdf"))
        .arg("1")
        .arg(format!("{}", 10.5 * unit))
        .arg(format!("{}", 30.5 * unit));
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("NODE\t/doc/a.tex\t5\t-1\n"));
}

#[test]
fn unknown_input_prints_nothing() {
    let dir = TempDir::new("synctex-cli").unwrap();
    write_document(dir.path());

    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("code")
        .arg(dir.path().join("main.pdf"))
        .arg("other.tex")
        .arg("1")
        .arg("0");
    cmd.assert().success().stdout(predicate::str::is_empty());
}

#[test]
fn update_then_dump() {
    let dir = TempDir::new("synctex-cli").unwrap();
    write_document(dir.path());
    let output = dir.path().join("main.pdf");

    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("update").arg(&output).arg("--magnification").arg("2");
    cmd.assert().success();
    let text = fs::read_to_string(dir.path().join("main.synctex")).unwrap();
    assert!(text.ends_with("Post scriptum:\nMagnification:2\n!16\n"));

    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("dump").arg(&output);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("version: 1"))
        .stdout(predicate::str::contains("k1,6:80,30:20"));
}

#[test]
fn build_directory_and_gzip() {
    let dir = TempDir::new("synctex-cli").unwrap();
    fs::create_dir(dir.path().join("out")).unwrap();
    let mut encoder = GzEncoder::new(
        File::create(dir.path().join("out/main.synctex.gz")).unwrap(),
        Compression::default(),
    );
    encoder.write_all(DOCUMENT.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("--build-dir")
        .arg("out")
        .arg("code")
        .arg(dir.path().join("main.pdf"))
        .arg("/doc/a.tex")
        .arg("5")
        .arg("0");
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("NODE\t1\t"));
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new("synctex-cli").unwrap();
    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("dump").arg(dir.path().join("main.pdf"));
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no synctex file found"));
}

#[test]
fn truncated_file_fails() {
    let dir = TempDir::new("synctex-cli").unwrap();
    fs::write(dir.path().join("main.synctex"), &DOCUMENT[..DOCUMENT.find("k1,6").unwrap()]).unwrap();
    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("dump").arg(dir.path().join("main.pdf"));
    cmd.assert().failure().code(1);
}

#[test]
fn bad_arguments_exit_with_one() {
    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("code").arg("main.pdf").arg("a.tex").arg("line").arg("0");
    cmd.assert().failure().code(1);

    let mut cmd = cargo_bin_cmd!("synctex");
    cmd.arg("--help");
    cmd.assert().success();
}
