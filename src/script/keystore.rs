//! Trust store preamble and build-request-processor invocations

use super::templates::INSTALL_KEYSTORE;

/// Launcher inside the build-request-processor image.
pub const PROCESSOR_LAUNCHER: &str = "/opt/jboss/container/java/run/run-java.sh";

/// Imports the cluster service CA into every JDK in the image, if mounted.
pub fn install_keystore_script() -> &'static str {
    INSTALL_KEYSTORE
}

/// Keystore preamble followed by one processor invocation per argument list.
pub fn run_in_processor(invocations: &[Vec<String>]) -> String {
    let mut script = String::from(INSTALL_KEYSTORE);
    for args in invocations {
        script.push_str(PROCESSOR_LAUNCHER);
        for arg in args {
            script.push(' ');
            script.push_str(arg);
        }
        script.push('\n');
    }
    script
}
