use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub config: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let config = make_fixture_config(tmp.path());
        Self { _tmp: tmp, config }
    }

    pub fn cmd(&self) -> Command {
        cargo_bin_cmd!("choropleth-card")
    }

    pub fn render_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("render")
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("render prints json")
    }
}

fn make_fixture_config(root: &Path) -> PathBuf {
    let data = root.join("data");
    fs::create_dir_all(&data).expect("create data dir");

    fs::write(
        data.join("cases_race.csv"),
        "state_fips,state_name,race_and_ethnicity,cases_per_100k\n\
         06,California,Asian,10\n\
         06,California,Not Hispanic or Latino,5\n\
         06,California,Black,\n\
         06,California,White,8\n\
         13,Georgia,Black,12\n\
         13,Georgia,White,9\n",
    )
    .expect("write race csv");

    fs::write(
        data.join("cases_sex.json"),
        r#"[
  {"state_fips": "06", "sex": "Female", "cases_per_100k": 3},
  {"state_fips": "06", "sex": "Male", "cases_per_100k": null},
  {"state_fips": "13", "sex": "Male", "cases_per_100k": 4}
]"#,
    )
    .expect("write sex json");

    let config = root.join("config.toml");
    fs::write(
        &config,
        r#"
[server]
port = 0

[[metrics]]
id = "cases_per_100k"
title = "Cases per 100k"

[[datasets]]
metric = "cases_per_100k"
dimension = "race_and_ethnicity"
path = "data/cases_race.csv"

[[datasets]]
metric = "cases_per_100k"
dimension = "sex"
path = "data/cases_sex.json"
"#,
    )
    .expect("write config");
    config
}
