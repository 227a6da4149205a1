/// Implemented by structs overridable through environment variables
pub trait EnvOverridable {
    /// Override self.fields through env vars
    fn load_env_overrides(&mut self);
}
