use std::fs;
use std::path::Path;
use storescrub::core::terms::MatchTermSet;
use storescrub::plugins::Applied;
use storescrub::plugins::tree::{load, purge};
use tempfile::tempdir;

const OTHER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<application>
  <component name="RecentProjectsManager">
    <option name="additionalInfo">
      <map>
        <entry key="/home/dev/augment-playground">
          <value>
            <RecentProjectMetaInfo frameTitle="playground">
              <option name="projectPath" value="/home/dev/augment-playground" />
              <option name="build" value="PY-243" />
            </RecentProjectMetaInfo>
          </value>
        </entry>
        <entry key="/home/dev/service">
          <value>
            <RecentProjectMetaInfo frameTitle="service">
              <option name="projectPath" value="/home/dev/service" />
            </RecentProjectMetaInfo>
          </value>
        </entry>
      </map>
    </option>
  </component>
  <component name="RecentFiles">
    <option value="/home/dev/notes/Augment.md" />
    <option value="/home/dev/service/main.py" />
  </component>
  <component name="PluginSettings">
    <plugin id="com.augmentcode.intellij" />
    <plugin id="org.rust.lang" />
    <comment>augmenting the editor</comment>
  </component>
</application>
"#;

fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

fn terms() -> MatchTermSet {
    MatchTermSet::from_terms(["augment"])
}

#[test]
fn test_purge_removes_every_matching_element() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("other.xml");
    write(&path, OTHER_XML);

    let applied = purge(&path, &terms()).unwrap();
    assert!(applied.is_changed());

    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.to_lowercase().contains("augment"), "left behind:\n{}", text);
    assert!(text.contains("/home/dev/service"));
    assert!(text.contains("/home/dev/service/main.py"));
    assert!(text.contains("org.rust.lang"));
    assert!(text.starts_with("<?xml"));
}

#[test]
fn test_purged_file_still_parses_with_root_intact() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("other.xml");
    write(&path, OTHER_XML);

    purge(&path, &terms()).unwrap();
    let root = load(&path).unwrap();
    assert_eq!(root.name, "application");
    assert_eq!(
        root.children.iter().filter(|n| n.as_element().is_some()).count(),
        3
    );
}

#[test]
fn test_second_purge_is_a_no_op() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("other.xml");
    write(&path, OTHER_XML);

    assert!(purge(&path, &terms()).unwrap().is_changed());
    let after_first = fs::read(&path).unwrap();
    assert_eq!(purge(&path, &terms()).unwrap(), Applied::Unchanged);
    assert_eq!(fs::read(&path).unwrap(), after_first);
}

#[test]
fn test_matching_root_is_kept() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("ide.general.xml");
    write(
        &path,
        r#"<application name="augment"><option name="x" value="1" /></application>"#,
    );

    assert_eq!(purge(&path, &terms()).unwrap(), Applied::Unchanged);
    assert_eq!(load(&path).unwrap().name, "application");
}

#[test]
fn test_no_match_leaves_file_bytes_identical() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("ide.general.xml");
    let content = "<application>\n  <component name=\"GeneralSettings\" />\n</application>\n";
    write(&path, content);

    assert_eq!(purge(&path, &terms()).unwrap(), Applied::Unchanged);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_malformed_xml_is_a_parse_failure() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("other.xml");
    write(&path, "<application><component name=\"augment\"></application>");

    let err = purge(&path, &terms()).unwrap_err();
    assert!(err.is_parse_failure(), "unexpected error: {}", err);
}
