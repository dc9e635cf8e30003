use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const TRIANGLE: &str = "v -0.5 -0.5 0\nv 0.5 -0.5 0\nv 0 0.5 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";

fn write_scene(dir: &Path, mesh: &str) -> std::path::PathBuf {
    let scene = format!(
        r#"<scene>
  <output>
    <width>16</width>
    <height>16</height>
    <directory>frames</directory>
    <prefix>t-</prefix>
    <extension>png</extension>
  </output>
  <model>
    <mesh>{mesh}</mesh>
  </model>
  <camera>
    <position>0 0 2</position>
    <target>0 0 0</target>
  </camera>
  <shadow>
    <size>32</size>
  </shadow>
  <animation>
    <fps>2</fps>
    <duration>1</duration>
    <track>
      <property>rotation_y</property>
      <from>0</from>
      <to>1</to>
    </track>
  </animation>
</scene>
"#
    );
    let path = dir.join("scene.xml");
    fs::write(&path, scene).expect("write scene");
    path
}

fn scene_with_mesh() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("tri.obj"), TRIANGLE).expect("write mesh");
    let scene = write_scene(dir.path(), "tri.obj");
    (dir, scene)
}

#[test]
fn cli_renders_every_frame() {
    let (dir, scene) = scene_with_mesh();
    let mut cmd = Command::cargo_bin("softlight").expect("binary exists");
    cmd.arg(&scene);
    cmd.assert()
        .success()
        .stdout(contains("Loaded mesh with 1 triangles"))
        .stdout(contains("Rendered 2 frame(s)"));

    let frames = dir.path().join("frames");
    for name in ["t-000.png", "t-001.png"] {
        let image = image::open(frames.join(name)).expect("frame written");
        assert_eq!((image.width(), image.height()), (16, 16));
    }
}

#[test]
fn cli_honours_output_dir_and_frame() {
    let (dir, scene) = scene_with_mesh();
    let out = dir.path().join("custom");
    let mut cmd = Command::cargo_bin("softlight").expect("binary exists");
    cmd.arg(&scene)
        .arg("--output-dir")
        .arg(&out)
        .arg("--frame")
        .arg("1");
    cmd.assert()
        .success()
        .stdout(contains("Rendered 1 frame(s)"));
    assert!(out.join("t-001.png").exists());
    assert!(!out.join("t-000.png").exists());
}

#[test]
fn cli_summary_only_writes_nothing() {
    let (dir, scene) = scene_with_mesh();
    let mut cmd = Command::cargo_bin("softlight").expect("binary exists");
    cmd.arg(&scene).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded mesh with 1 triangles"))
        .stdout(contains(" - frame 001 rotation=0.5000"));
    assert!(!dir.path().join("frames").exists());
}

#[test]
fn cli_fails_when_assets_are_missing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let scene = write_scene(dir.path(), "missing.obj");
    let mut cmd = Command::cargo_bin("softlight").expect("binary exists");
    cmd.arg(&scene);
    cmd.assert()
        .failure()
        .stderr(contains("failed to load model assets"));
    assert!(!dir.path().join("frames").exists());
}

#[test]
fn cli_rejects_unknown_arguments() {
    let (_dir, scene) = scene_with_mesh();
    let mut cmd = Command::cargo_bin("softlight").expect("binary exists");
    cmd.arg(&scene).arg("--bogus");
    cmd.assert().failure().stderr(contains("Unknown argument: --bogus"));
}

#[test]
fn cli_rejects_frame_past_the_sequence() {
    let (dir, scene) = scene_with_mesh();
    let mut cmd = Command::cargo_bin("softlight").expect("binary exists");
    cmd.arg(&scene).arg("--frame").arg("2");
    cmd.assert()
        .failure()
        .stderr(contains("frame 2 is out of range"));
    assert!(!dir.path().join("frames").exists());
}
