//! The directory tree a fresh install starts with.
//!
//! Seeding happens once, when there is no saved tree. Afterwards the seeded
//! files are ordinary files: users may edit or delete them.

use kpawnd_boot::GRUB_CFG_PATH;
use kpawnd_vfs::{Vfs, VfsResult, ROOT_OWNER};
use tracing::debug;

use crate::builtins::BUILTINS;
use crate::config::EngineConfig;

pub(crate) const GITHUB_URL: &str = "https://www.github.com/kpawnd";

/// Stand-in bytes for a binary in `/bin`.
fn binary(name: &str) -> Vec<u8> {
    let mut bytes = b"\x7fELF\x02\x01\x01\x00".to_vec();
    bytes.extend_from_slice(format!("kpawnd {}\n", name).as_bytes());
    bytes
}

/// Home directory for `user`.
pub fn home_dir(user: &str) -> String {
    if user == ROOT_OWNER {
        "/root".to_string()
    } else {
        format!("/home/{}", user)
    }
}

/// Build the initial tree, with a home for `user`.
pub fn seed(config: &EngineConfig, user: &str) -> VfsResult<Vfs> {
    let mut vfs = Vfs::new();
    let r = ROOT_OWNER;

    for dir in [
        "/bin", "/boot/grub", "/dev", "/etc", "/home", "/proc", "/sbin", "/tmp",
        "/usr/share", "/var/log",
    ] {
        vfs.mkdir_all(dir, r)?;
    }

    vfs.write("/bin/sh", &binary("sh"), r)?;
    for builtin in BUILTINS {
        vfs.write(&format!("/bin/{}", builtin.name), &binary(builtin.name), r)?;
    }
    vfs.write("/sbin/init", &binary("init"), r)?;

    let kernel = &config.kernel_version;
    vfs.write(&format!("/boot/vmlinuz-{}", kernel), &binary("vmlinuz"), r)?;
    vfs.write(&format!("/boot/initrd.img-{}", kernel), &binary("initrd"), r)?;
    vfs.write("/boot/memtest86+.bin", &binary("memtest86+"), r)?;
    vfs.write(
        GRUB_CFG_PATH,
        config.boot.render_file(kernel).as_bytes(),
        r,
    )?;

    vfs.write("/dev/null", b"", r)?;
    vfs.write("/dev/tty", b"", r)?;

    vfs.write("/etc/hostname", format!("{}\n", config.hostname).as_bytes(), r)?;
    vfs.write("/etc/github", format!("{}\n", GITHUB_URL).as_bytes(), r)?;
    vfs.write(
        "/etc/os-release",
        format!(
            "NAME=\"kpawnd GNU/Linux\"\nVERSION=\"{v}\"\nID=kpawnd\nPRETTY_NAME=\"kpawnd GNU/Linux {v}\"\nHOME_URL=\"{url}\"\n",
            v = config.version,
            url = GITHUB_URL
        )
        .as_bytes(),
        r,
    )?;
    vfs.write(
        "/etc/motd",
        format!(
            "Welcome to kpawnd {}.\nType 'help' to list commands.\n",
            config.version
        )
        .as_bytes(),
        r,
    )?;
    vfs.write("/etc/passwd", passwd(user).as_bytes(), r)?;

    vfs.write(
        "/proc/cpuinfo",
        b"processor\t: 0\nmodel name\t: kpawnd virtual processor @ 2.40GHz\ncpu cores\t: 1\n",
        r,
    )?;
    vfs.write("/proc/version", format!("Linux version {}\n", kernel).as_bytes(), r)?;
    vfs.write("/var/log/boot.log", b"", r)?;

    ensure_home(&mut vfs, user)?;
    if !vfs.exists("/root") {
        vfs.mkdir("/root", r)?;
    }
    debug!(user, "seeded filesystem");
    Ok(vfs)
}

/// Create `user`'s home with its welcome file if it does not exist yet.
pub fn ensure_home(vfs: &mut Vfs, user: &str) -> VfsResult<()> {
    let home = home_dir(user);
    if vfs.exists(&home) {
        return Ok(());
    }
    vfs.mkdir_all(&home, user)?;
    vfs.write(
        &format!("{}/readme.txt", home),
        b"Echo github to open profile.\n",
        user,
    )
}

/// Put back whatever init needs to start. Returns the paths restored.
pub fn restore_init(vfs: &mut Vfs) -> VfsResult<Vec<&'static str>> {
    let mut restored = Vec::new();
    for (path, name) in [("/bin/sh", "sh"), ("/sbin/init", "init")] {
        if vfs.exists(path) {
            continue;
        }
        let parent = &path[..path.rfind('/').unwrap_or(0)];
        vfs.mkdir_all(parent, ROOT_OWNER)?;
        vfs.write(path, &binary(name), ROOT_OWNER)?;
        restored.push(path);
    }
    Ok(restored)
}

fn passwd(user: &str) -> String {
    let mut out = String::from("root:x:0:0:root:/root:/bin/sh\n");
    if user != ROOT_OWNER {
        out.push_str(&format!(
            "{u}:x:1000:1000:{u}:/home/{u}:/bin/sh\n",
            u = user
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_layout() {
        let vfs = seed(&EngineConfig::default(), "user").unwrap();
        for path in ["/bin/sh", "/bin/ls", "/sbin/init", GRUB_CFG_PATH, "/etc/github", "/tmp"] {
            assert!(vfs.exists(path), "{} missing", path);
        }
        assert_eq!(vfs.stat("/home/user").unwrap().owner, "user");
        assert_eq!(vfs.stat("/home/user/readme.txt").unwrap().owner, "user");
        assert_eq!(vfs.stat("/etc").unwrap().owner, "root");
        assert_eq!(vfs.read_to_string("/etc/hostname").unwrap(), "kpawnd\n");
    }

    #[test]
    fn test_root_home() {
        assert_eq!(home_dir("root"), "/root");
        assert_eq!(home_dir("alice"), "/home/alice");
        let vfs = seed(&EngineConfig::default(), "root").unwrap();
        assert!(!vfs.exists("/home/root"));
        assert!(vfs.exists("/root/readme.txt"));
    }

    #[test]
    fn test_restore_init_only_fills_gaps() {
        let mut vfs = seed(&EngineConfig::default(), "user").unwrap();
        vfs.write("/bin/sh", b"custom", ROOT_OWNER).unwrap();
        vfs.remove("/sbin", true).unwrap();

        assert_eq!(restore_init(&mut vfs).unwrap(), vec!["/sbin/init"]);
        assert_eq!(vfs.read("/bin/sh").unwrap(), b"custom");
        assert!(vfs.exists("/sbin/init"));
        assert!(restore_init(&mut vfs).unwrap().is_empty());
    }
}
