//! Shell script builders.
//!
//! Every function here is pure: it returns script text and touches nothing.
//! Scripts target bash on the remote host and are safe to re-run.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Heredoc delimiter used by [`build_file_write_command`].
const HEREDOC_DELIMITER: &str = "EOF";

/// `with_backoff <cmd...>`: up to 10 attempts, sleeping 10s after the first
/// failure and doubling after each one. Returns the last exit code.
pub const BACKOFF_FUNCTION: &str = r#"
function with_backoff {
  local max_attempts=10
  local timeout=10
  local attempt=0
  local exit_code=0

  set +e
  while [ "$attempt" -lt "$max_attempts" ]; do
    "$@"
    exit_code="$?"

    if [ "$exit_code" = 0 ]; then
      set -e
      break
    fi

    echo "Failure running ($*) [$exit_code]; retrying in $timeout." 1>&2
    sleep "$timeout"
    attempt="$((attempt + 1))"
    timeout="$((timeout * 2))"
  done

  if [ "$exit_code" != 0 ]; then
    echo "Failure running ($*) [$exit_code]; No more retries left." 1>&2
  fi

  set -e
  return "$exit_code"
}
"#;

/// Join script fragments.
///
/// `None` fragments are skipped. Every present fragment is followed by a
/// newline unless it already ends with one, so an empty fragment yields a
/// single blank line.
pub fn concat_commands<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut script = String::new();
    for fragment in fragments.into_iter().flatten() {
        let fragment = fragment.as_ref();
        script.push_str(fragment);
        if !fragment.ends_with('\n') {
            script.push('\n');
        }
    }
    script
}

/// Create `remote_path` and hand it to the connecting user.
pub fn build_remote_path_init_command(remote_path: &str) -> String {
    format!(
        "sudo mkdir -p \"{remote_path}\"\n\
         sudo chown -Rv \"$USER:$USER\" \"{remote_path}\"\n"
    )
}

/// Write `contents` to `path` through `tee`.
///
/// Contents that contain the heredoc delimiter are shipped base64-encoded
/// instead; a quoted heredoc would otherwise end early.
pub fn build_file_write_command(path: &str, contents: &str) -> String {
    if contents.contains(HEREDOC_DELIMITER) {
        let encoded = BASE64.encode(contents.as_bytes());
        format!("echo '{encoded}' | base64 -d | tee \"{path}\"\n")
    } else {
        format!(
            "cat << '{HEREDOC_DELIMITER}' | tee \"{path}\"\n{contents}\n{HEREDOC_DELIMITER}\n"
        )
    }
}

/// Delete every file under `remote_path` that is not listed in `file_list`.
///
/// Entries of `file_list` are relative to `remote_path`. Files are streamed
/// NUL-delimited so whitespace and newlines in names are harmless, and kept
/// paths are matched exactly through an associative array.
pub fn build_clean_command<I, S>(remote_path: &str, file_list: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let base = remote_path.trim_end_matches('/');
    let keep = file_list
        .into_iter()
        .map(|f| format!("[{}]=1", single_quote(&format!("{base}/{}", f.as_ref()))))
        .collect::<Vec<_>>()
        .join(" ");
    let root = if base.is_empty() { "/" } else { base };

    let mut script = String::new();
    script.push_str(&format!("declare -A keep_files=({keep})\n"));
    script.push_str("while IFS= read -r -d '' file; do\n");
    script.push_str("  if [[ -z \"${keep_files[$file]+x}\" ]]; then\n");
    script.push_str("    echo \"Deleting: $file\"\n");
    script.push_str("    rm \"$file\"\n");
    script.push_str("  fi\n");
    script.push_str(&format!(
        "done < <(find {} -type f -print0)\n",
        single_quote(root)
    ));
    script
}

/// Wrap `value` in single quotes so bash takes it literally.
fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Options for [`build_run_command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommand<'a> {
    pub remote_path: &'a str,
    pub id: &'a str,
    /// Defaults to `true`.
    pub with_backoff: Option<bool>,
    /// Replacement for [`BACKOFF_FUNCTION`]. Ignored when backoff is off.
    pub with_backoff_definition: Option<&'a str>,
}

impl<'a> RunCommand<'a> {
    pub fn new(remote_path: &'a str, id: &'a str) -> Self {
        Self {
            remote_path,
            id,
            with_backoff: None,
            with_backoff_definition: None,
        }
    }

    pub fn with_backoff(mut self, enabled: bool) -> Self {
        self.with_backoff = Some(enabled);
        self
    }

    pub fn with_backoff_definition(mut self, definition: &'a str) -> Self {
        self.with_backoff_definition = Some(definition);
        self
    }
}

/// Install requirements (when present) and run the playbook `<id>.yml`.
pub fn build_run_command(opts: &RunCommand<'_>) -> String {
    let with_backoff = opts.with_backoff.unwrap_or(true);
    let (definition, prefix) = if with_backoff {
        (
            opts.with_backoff_definition.unwrap_or(BACKOFF_FUNCTION),
            "with_backoff ",
        )
    } else {
        ("", "")
    };

    let mut script = String::from("set -eu\n");
    script.push_str(definition);
    script.push('\n');
    script.push_str(&format!("cd \"{}\"\n", opts.remote_path));
    script.push_str(&format!(
        "[[ -s requirements.yml ]] && {prefix}ansible-galaxy install -r requirements.yml\n"
    ));
    script.push_str(&format!(
        "{prefix}ansible-playbook -i localhost, '{}.yml'\n",
        opts.id
    ));
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn concat_skips_none_and_terminates_lines() {
        let cmd = concat_commands([
            Some("echo a\n"),
            Some(""),
            Some("\n"),
            None,
            Some("echo b\necho c"),
            Some("echo d"),
        ]);
        assert_eq!(cmd, "echo a\n\n\necho b\necho c\necho d\n");
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        assert_eq!(concat_commands(Vec::<Option<String>>::new()), "");
        assert_eq!(concat_commands([None::<&str>, None]), "");
    }

    #[test]
    fn remote_path_init() {
        assert_eq!(
            build_remote_path_init_command("/root"),
            "sudo mkdir -p \"/root\"\nsudo chown -Rv \"$USER:$USER\" \"/root\"\n"
        );
    }

    #[test]
    fn file_write_uses_heredoc_without_delimiter() {
        let cmd = build_file_write_command("/foo.yaml", "---\na: foo\nb: bar\n");
        assert_eq!(
            cmd,
            "cat << 'EOF' | tee \"/foo.yaml\"\n---\na: foo\nb: bar\n\nEOF\n"
        );
    }

    #[test]
    fn file_write_switches_to_base64_on_delimiter() {
        let cmd = build_file_write_command("/bin/hello", "cat << 'EOF'\nhello world!\nEOF");
        assert_eq!(
            cmd,
            "echo 'Y2F0IDw8ICdFT0YnCmhlbGxvIHdvcmxkIQpFT0Y=' | base64 -d | tee \"/bin/hello\"\n"
        );
    }

    #[test]
    fn file_write_base64_payload_decodes_to_original() {
        let contents = "x: EOF\nunicode: héllo ✓\n";
        let cmd = build_file_write_command("/t", contents);
        let payload = cmd
            .strip_prefix("echo '")
            .and_then(|rest| rest.split('\'').next())
            .unwrap();
        let decoded = BASE64.decode(payload).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), contents);
    }

    #[test]
    fn clean_command_lists_keep_files() {
        let cmd = build_clean_command("/var/ansible", ["main.yml", "web/tasks/main.yml"]);
        assert_eq!(
            cmd,
            "declare -A keep_files=(['/var/ansible/main.yml']=1 ['/var/ansible/web/tasks/main.yml']=1)\n\
             while IFS= read -r -d '' file; do\n  \
             if [[ -z \"${keep_files[$file]+x}\" ]]; then\n    \
             echo \"Deleting: $file\"\n    \
             rm \"$file\"\n  \
             fi\n\
             done < <(find '/var/ansible' -type f -print0)\n"
        );
    }

    #[test]
    fn clean_command_quotes_shell_metacharacters() {
        let cmd = build_clean_command("/r/", ["it's $HOME `id`.yml"]);
        assert!(
            cmd.starts_with("declare -A keep_files=(['/r/it'\\''s $HOME `id`.yml']=1)\n"),
            "{cmd}"
        );
        assert!(cmd.ends_with("done < <(find '/r' -type f -print0)\n"));
    }

    #[test]
    fn clean_command_at_filesystem_root() {
        let cmd = build_clean_command("/", ["a.yml"]);
        assert!(cmd.starts_with("declare -A keep_files=(['/a.yml']=1)\n"));
        assert!(cmd.ends_with("done < <(find '/' -type f -print0)\n"));
    }

    #[test]
    fn run_command_minimal_uses_backoff() {
        let cmd = build_run_command(&RunCommand::new("/root", "main"));
        assert_eq!(
            cmd,
            format!(
                "set -eu\n{BACKOFF_FUNCTION}\ncd \"/root\"\n\
                 [[ -s requirements.yml ]] && with_backoff ansible-galaxy install -r requirements.yml\n\
                 with_backoff ansible-playbook -i localhost, 'main.yml'\n"
            )
        );
    }

    #[test]
    fn run_command_without_backoff() {
        let cmd = build_run_command(&RunCommand::new("/root", "main").with_backoff(false));
        assert_eq!(
            cmd,
            "set -eu\n\ncd \"/root\"\n\
             [[ -s requirements.yml ]] && ansible-galaxy install -r requirements.yml\n\
             ansible-playbook -i localhost, 'main.yml'\n"
        );
    }

    #[test]
    fn run_command_custom_definition() {
        let def = "function with_backoff {\n  \"$@\"\n}";
        let cmd = build_run_command(
            &RunCommand::new("/root", "main")
                .with_backoff(true)
                .with_backoff_definition(def),
        );
        assert_eq!(
            cmd,
            "set -eu\nfunction with_backoff {\n  \"$@\"\n}\ncd \"/root\"\n\
             [[ -s requirements.yml ]] && with_backoff ansible-galaxy install -r requirements.yml\n\
             with_backoff ansible-playbook -i localhost, 'main.yml'\n"
        );
    }

    #[rstest]
    #[case(None, None, true)]
    #[case(Some(true), None, true)]
    #[case(Some(false), None, false)]
    #[case(Some(false), Some("function with_backoff {\n  \"$@\"\n}"), false)]
    fn backoff_presence(
        #[case] with_backoff: Option<bool>,
        #[case] definition: Option<&str>,
        #[case] expect_backoff: bool,
    ) {
        let opts = RunCommand {
            remote_path: "/root",
            id: "main",
            with_backoff,
            with_backoff_definition: definition,
        };
        let cmd = build_run_command(&opts);
        assert_eq!(cmd.contains("function with_backoff"), expect_backoff);
        assert_eq!(cmd.contains("with_backoff ansible-playbook"), expect_backoff);
        assert_eq!(cmd.contains("with_backoff ansible-galaxy"), expect_backoff);
    }
}
