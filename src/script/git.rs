//! Source checkout command

use crate::model::{BuildIdentity, BuildRecipe};

/// Clones `$(params.URL)` into the source workspace and resets to
/// `$(params.HASH)`, storing `$GIT_TOKEN` as credentials for private
/// repositories.
pub fn git_checkout_script(identity: &BuildIdentity, recipe: &BuildRecipe) -> String {
    let mut script = String::from(
        "echo \"Cloning $(params.URL) and resetting to $(params.HASH)\" && ",
    );
    if identity.scm.private {
        script.push_str(
            "echo \"$GIT_TOKEN\" > $HOME/.git-credentials && chmod 400 $HOME/.git-credentials && ",
        );
        script.push_str("echo '[credential]\n        helper=store\n' > $HOME/.gitconfig && ");
    }
    script.push_str(
        "git clone $(params.URL) $(workspaces.source.path)/source && cd $(workspaces.source.path)/source && git reset --hard $(params.HASH)",
    );
    if !recipe.disable_submodules {
        script.push_str(" && git submodule init && git submodule update --recursive");
    }
    script
}
