//! The fixed builtin table.
//!
//! Every command the shell knows is one [`Builtin`] row. The table drives
//! dispatch, `help`, `which`, tab completion and the stand-in binaries
//! seeded into `/bin`.

mod files;
mod net;
mod programs;
mod system;
mod text;

use crate::engine::Engine;
use crate::error::ShellResult;
use crate::output::Output;
use crate::parser::Invocation;

/// Handler signature shared by every builtin.
pub(crate) type Handler = fn(&mut Engine, &Invocation) -> ShellResult<Output>;

/// Section a builtin is listed under in `help`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Files,
    Text,
    System,
    Programs,
    Network,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Files,
        Category::Text,
        Category::System,
        Category::Programs,
        Category::Network,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Category::Files => "Files",
            Category::Text => "Text",
            Category::System => "System",
            Category::Programs => "Programs",
            Category::Network => "Network",
        }
    }
}

/// One row of the builtin table.
pub struct Builtin {
    pub name: &'static str,
    pub category: Category,
    /// Synopsis shown by `help` and `man`
    pub usage: &'static str,
    pub summary: &'static str,
    pub(crate) run: Handler,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

const fn builtin(
    name: &'static str,
    category: Category,
    usage: &'static str,
    summary: &'static str,
    run: Handler,
) -> Builtin {
    Builtin {
        name,
        category,
        usage,
        summary,
        run,
    }
}

use Category::{Files, Network, Programs, System, Text};

#[rustfmt::skip]
pub const BUILTINS: &[Builtin] = &[
    // Files
    builtin("ls", Files, "ls [-l] [-a] [path...]", "list directory contents", files::ls),
    builtin("cd", Files, "cd [dir]", "change the working directory", files::cd),
    builtin("pwd", Files, "pwd", "print the working directory", files::pwd),
    builtin("cat", Files, "cat <file>...", "print files", files::cat),
    builtin("touch", Files, "touch <file>...", "create empty files", files::touch),
    builtin("mkdir", Files, "mkdir [-p] <dir>...", "make directories", files::mkdir),
    builtin("rm", Files, "rm [-r] [-f] <path>...", "remove files or directories", files::rm),
    builtin("rmdir", Files, "rmdir <dir>...", "remove empty directories", files::rmdir),
    builtin("cp", Files, "cp [-r] <src> <dest>", "copy files and directories", files::cp),
    builtin("mv", Files, "mv <src> <dest>", "move or rename", files::mv),
    builtin("chown", Files, "chown [-R] <owner>[:group] <path>...", "change owner", files::chown),
    builtin("chmod", Files, "chmod <mode> <path>...", "change mode bits", files::chmod),
    builtin("tree", Files, "tree [dir]", "show a directory tree", files::tree),
    builtin("find", Files, "find [dir] [-name pattern]", "search for files", files::find),
    builtin("du", Files, "du [path]", "estimate space usage", files::du),
    builtin("df", Files, "df", "report filesystem usage", files::df),
    builtin("file", Files, "file <path>...", "determine file type", files::file),
    builtin("stat", Files, "stat <path>...", "show node details", files::stat),
    // Text
    builtin("echo", Text, "echo [text...]", "print text", text::echo),
    builtin("head", Text, "head [-n N] <file>", "first lines of a file", text::head),
    builtin("tail", Text, "tail [-n N] <file>", "last lines of a file", text::tail),
    builtin("wc", Text, "wc <file>...", "count lines, words and bytes", text::wc),
    builtin("grep", Text, "grep [-i] [-n] <pattern> <file>...", "search text", text::grep),
    builtin("sort", Text, "sort [-r] <file>", "sort lines", text::sort),
    builtin("uniq", Text, "uniq <file>", "drop repeated lines", text::uniq),
    builtin("diff", Text, "diff <a> <b>", "compare two files", text::diff),
    // System
    builtin("whoami", System, "whoami", "print the effective user", system::whoami),
    builtin("id", System, "id", "print user and group ids", system::id),
    builtin("hostname", System, "hostname", "print the host name", system::hostname),
    builtin("uname", System, "uname [-a|-r|-s|-n|-m|-o]", "print system information", system::uname),
    builtin("uptime", System, "uptime", "time since boot", system::uptime),
    builtin("free", System, "free", "memory usage", system::free),
    builtin("ps", System, "ps", "list processes", system::ps),
    builtin("kill", System, "kill <pid>", "terminate a process", system::kill),
    builtin("history", System, "history", "list previous commands", system::history),
    builtin("env", System, "env", "print the environment", system::env),
    builtin("export", System, "export NAME=value", "set an environment variable", system::export),
    builtin("alias", System, "alias [name=command]", "define or list aliases", system::alias),
    builtin("which", System, "which <command>...", "locate a command", system::which),
    builtin("help", System, "help", "list commands", system::help),
    builtin("man", System, "man <command>", "show a command's manual", system::man),
    builtin("clear", System, "clear", "clear the terminal", system::clear),
    builtin("exit", System, "exit", "close the terminal", system::exit),
    builtin("reboot", System, "reboot", "restart the system", system::reboot),
    builtin("neofetch", System, "neofetch", "show system information", system::neofetch),
    builtin("sudo", System, "sudo <command>", "run a command as root", system::sudo),
    builtin("update-grub", System, "update-grub", "regenerate grub.cfg", system::update_grub),
    // Programs
    builtin("nano", Programs, "nano <file>", "edit a file", programs::edit),
    builtin("vi", Programs, "vi <file>", "edit a file", programs::edit),
    builtin("vim", Programs, "vim <file>", "edit a file", programs::edit),
    builtin("python", Programs, "python", "start the Python prompt", programs::python),
    builtin("python3", Programs, "python3", "start the Python prompt", programs::python),
    builtin("doom", Programs, "doom [easy|normal|hard]", "play DOOM", programs::doom),
    builtin("screensaver", Programs, "screensaver", "start the screensaver", programs::screensaver),
    builtin("grace", Programs, "grace", "start grace", programs::grace),
    builtin("snake", Programs, "snake", "play snake", programs::snake),
    // Network
    builtin("wget", Network, "wget <url>", "download a URL", net::wget),
    builtin("curl", Network, "curl [-I] [-X METHOD] <url>", "transfer a URL", net::curl),
    builtin("ping", Network, "ping <host>", "probe a host", net::ping),
    builtin("host", Network, "host <name>", "DNS lookup", net::dns),
    builtin("nslookup", Network, "nslookup <name>", "DNS lookup", net::dns),
    builtin("dig", Network, "dig <name>", "DNS lookup", net::dns),
    builtin("myip", Network, "myip", "show the public address", net::myip),
    builtin("ifconfig", Network, "ifconfig", "show network interfaces", net::ifconfig),
];

/// Find a builtin by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Builtin names starting with `prefix`, in table order.
pub fn names_with_prefix(prefix: &str) -> impl Iterator<Item = &'static str> + '_ {
    BUILTINS
        .iter()
        .map(|b| b.name)
        .filter(move |name| name.starts_with(prefix))
}
