use std::io::{self, BufRead, BufReader, Read, Write};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command as StdCommand, Output, Stdio};

use assert_cmd::Command;
use pretty_assertions::assert_eq;

const BIN: &str = env!("CARGO_BIN_EXE_mini-shell");
const NOT_FOUND: &str = "Command not found--Did you mean something else?";

fn shell() -> Command {
    let mut cmd = Command::new(BIN);
    cmd.env_remove("MINI_SHELL_LOG");
    cmd
}

/// Feed `input` on standard input and return everything printed on standard output.
fn session(input: &str) -> String {
    let assert = shell().write_stdin(input).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Start the shell with standard input held open by the test.
fn spawn_interactive(args: &[&str]) -> Child {
    StdCommand::new(BIN)
        .args(args)
        .env_remove("MINI_SHELL_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap()
}

/// Run the shell with at most `limit` open descriptors.
fn run_with_descriptor_limit(limit: u64, input: &[u8]) -> io::Result<Output> {
    let mut cmd = StdCommand::new(BIN);
    cmd.env_remove("MINI_SHELL_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // SAFETY: setrlimit(2) is async-signal-safe and nothing else runs in the child.
    unsafe {
        cmd.pre_exec(move || {
            let rlimit = libc::rlimit {
                rlim_cur: limit as libc::rlim_t,
                rlim_max: limit as libc::rlim_t,
            };
            if libc::setrlimit(libc::RLIMIT_NOFILE, &rlimit) == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
    let mut child = cmd.spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        // the shell may already be gone
        let _ = stdin.write_all(input);
    }
    child.wait_with_output()
}

#[test]
fn prompt_precedes_every_read() {
    assert_eq!(session("echo hi\n"), "mini-shell>>> hi\nmini-shell>>> ");

    let assert = shell()
        .args(["--prompt", "$ "])
        .write_stdin("echo hi\n")
        .assert()
        .success();
    assert_eq!(assert.get_output().stdout, b"$ hi\n$ ");
}

#[test]
fn undecodable_line_is_skipped() {
    let assert = shell()
        .write_stdin(&b"echo caf\xe9\necho after\n"[..])
        .assert()
        .success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.contains("mini-shell: input is not valid UTF-8\n"), "{out}");
    assert!(out.contains("after\n"), "{out}");
}

#[test]
fn running_out_of_descriptors_is_fatal() {
    let input = b"true | true\necho survived\n";
    let fatal = (3..=32).filter_map(|limit| run_with_descriptor_limit(limit, input).ok()).find(
        |output| String::from_utf8_lossy(&output.stdout).contains("fork failed for some reason!"),
    );

    let output = fatal.expect("no descriptor limit made the pipeline fail");
    let out = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert!(!out.contains("survived"), "{out}");
}

#[test]
fn echo_prints_arguments() {
    assert!(session("echo a b c\n").contains("a b c\n"));
}

#[test]
fn history_lists_every_line_in_order() {
    let out = session("echo one\n\nls /definitely/not/here\nhistory\n");
    assert!(
        out.contains("   1    echo one\n   2    \n   3    ls /definitely/not/here\n   4    history\n"),
        "{out}"
    );
}

#[test]
fn exit_stops_reading() {
    let out = session("echo before\nexit\necho after\n");
    assert!(out.contains("before\n"));
    assert!(!out.contains("after"));
}

#[test]
fn end_of_input_ends_quietly() {
    let out = session("echo only\n");
    assert!(out.contains("only\n"));
    assert!(!out.contains("terminated"));
    assert!(!out.contains("timed out"));
}

#[test]
fn pipe_into_external_program() {
    let out = session("echo hello | cat\n");
    assert_eq!(out.matches("hello\n").count(), 1);
}

#[test]
fn external_pipe_into_external_program() {
    let out = session("printf abc | tr a-z A-Z\n");
    assert!(out.contains("ABC"), "{out}");
}

#[test]
fn missing_left_stage_is_reported_once_and_loop_resumes() {
    let out = session("definitely-not-a-real-program-4711 | cat\necho next\n");
    assert_eq!(out.matches(NOT_FOUND).count(), 1);
    assert!(out.contains("next\n"));
}

#[test]
fn missing_program_does_not_end_the_session() {
    let out = session("definitely-not-a-real-program-4711\necho still here\n");
    assert_eq!(out.matches(NOT_FOUND).count(), 1);
    assert!(out.contains("still here\n"));
}

#[test]
fn failing_program_is_not_reported() {
    let out = session("false\necho done\n");
    assert!(!out.contains(NOT_FOUND));
    assert!(out.contains("done\n"));
}

#[test]
fn malformed_lines_are_diagnosed() {
    let out = session("echo a | echo b | echo c\necho x |\n");
    assert!(out.contains("mini-shell: only one '|' is supported per line\n"));
    assert!(out.contains("mini-shell: syntax error near unexpected token '|'\n"));
    assert!(!out.contains("a\n"));
}

#[test]
fn line_limit_is_configurable() {
    let line = format!("echo {}\n", "z".repeat(100));
    let out = session(&line);
    assert!(out.contains("mini-shell: input line too long (max 79 bytes)\n"));

    let assert = shell()
        .args(["--max-line", "200"])
        .write_stdin(line)
        .assert()
        .success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(out.contains(&"z".repeat(100)));
}

#[test]
fn cd_affects_later_commands() {
    let temp = tempfile::tempdir().unwrap();
    let canonical = std::fs::canonicalize(temp.path()).unwrap();
    let out = session(&format!("cd {}\npwd\n", canonical.display()));
    assert!(out.contains(&format!("{}\n", canonical.display())), "{out}");
}

#[test]
fn bad_cd_target_is_reported() {
    let out = session("cd /definitely/not/here\n");
    assert!(out.contains("cd: /definitely/not/here: No such file or directory!\n"));
}

#[test]
fn help_describes_builtins() {
    let out = session("help\n");
    for name in ["cd", "echo", "exit", "help", "history"] {
        assert!(out.contains(&format!("\t{name} -- ")), "{name}");
    }
}

#[test]
fn interrupt_says_goodbye_and_succeeds() {
    let mut child = spawn_interactive(&[]);
    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());

    stdin.write_all(b"echo ready\n").unwrap();
    stdin.flush().unwrap();
    let mut line = String::new();
    while !line.contains("ready") {
        line.clear();
        assert_ne!(stdout.read_line(&mut line).unwrap(), 0, "shell exited early");
    }

    let pid = libc::pid_t::try_from(child.id()).unwrap();
    assert_eq!(unsafe { libc::kill(pid, libc::SIGINT) }, 0);

    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    let status = child.wait().unwrap();
    drop(stdin);

    assert!(rest.contains("mini-shell terminated!\n"), "{rest}");
    assert!(status.success());
}

#[test]
fn idle_timeout_ends_the_session() {
    let mut child = spawn_interactive(&["--timeout", "1"]);
    // keep standard input open so that only the alarm can end the session
    let stdin = child.stdin.take().unwrap();

    let mut out = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut out)
        .unwrap();
    let status = child.wait().unwrap();
    drop(stdin);

    assert!(out.contains("mini-shell timed out!\n"), "{out}");
    assert!(status.success());
}

#[test]
fn unknown_flag_is_rejected() {
    shell().arg("--no-such-flag").assert().failure();
}
