use std::process::Command;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Builds a command for an external tool without popping a console window on Windows.
pub fn command(program: &str) -> Command {
    #[cfg_attr(not(windows), allow(unused_mut))]
    let mut cmd = Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Splits a configured command line like `python -m yt_dlp` into program and leading args.
pub fn split_command(line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_leading_arguments() {
        assert_eq!(
            split_command("python -m yt_dlp"),
            Some((
                "python".to_string(),
                vec!["-m".to_string(), "yt_dlp".to_string()]
            ))
        );
        assert_eq!(split_command("   "), None);
    }
}
