use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use mlua::{HookTriggers, Lua};

use crate::cache::{MathPools, PoolStats};
use crate::config::MathConfig;
use crate::pose::PoseModel;
use crate::rig::ScriptSource;

use super::bindings::{register_globals, ScriptContext};

/// Pool usage of one finished script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptReport {
    pub name: String,
    pub stats: [(&'static str, PoolStats); 6],
}

/// Runs avatar scripts, each on its own thread with its own Lua state and pools.
pub struct LuaScriptManager {
    scripts: Vec<ScriptSource>,
    pose: PoseModel,
    config: MathConfig,
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<Result<ScriptReport>>>,
    reports: Vec<ScriptReport>,
}

impl LuaScriptManager {
    pub fn new(scripts: Vec<ScriptSource>, pose: PoseModel, config: MathConfig) -> Self {
        Self {
            scripts,
            pose,
            config,
            running: Arc::new(AtomicBool::new(false)),
            threads: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Launches every script. Returns how many threads were started.
    pub fn start(&mut self) -> Result<usize> {
        self.stop()?;
        self.reports.clear();
        if self.scripts.is_empty() {
            return Ok(0);
        }

        self.running.store(true, Ordering::Release);
        for script in self.scripts.iter().cloned() {
            let pose = self.pose.clone();
            let config = self.config.clone();
            let running = Arc::clone(&self.running);
            let handle = thread::Builder::new()
                .name(format!("lua:{}", script.name))
                .spawn(move || run_script_thread(script, pose, config, running))
                .context("failed to spawn script thread")?;
            self.threads.push(handle);
        }
        Ok(self.threads.len())
    }

    /// Blocks until every running script finishes.
    pub fn wait(&mut self) -> Result<()> {
        self.join_threads()
    }

    /// Requests that all scripts stop and waits for them to exit.
    pub fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        self.join_threads()
    }

    /// Reports of the scripts that completed since the last `start`.
    pub fn reports(&self) -> &[ScriptReport] {
        &self.reports
    }

    fn join_threads(&mut self) -> Result<()> {
        if self.threads.is_empty() {
            return Ok(());
        }
        let handles = std::mem::take(&mut self.threads);
        let mut errors = Vec::new();
        for handle in handles {
            match handle.join() {
                Ok(Ok(report)) => self.reports.push(report),
                Ok(Err(err)) => errors.push(err),
                Err(panic) => errors.push(anyhow!("script thread panicked: {:?}", panic)),
            }
        }
        self.running.store(false, Ordering::Release);
        if errors.is_empty() {
            Ok(())
        } else {
            let message = errors
                .into_iter()
                .map(|err| format!("{err:#}"))
                .collect::<Vec<_>>()
                .join("; ");
            Err(anyhow!("{message}"))
        }
    }
}

impl Drop for LuaScriptManager {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn run_script_thread(
    script: ScriptSource,
    pose: PoseModel,
    config: MathConfig,
    running: Arc<AtomicBool>,
) -> Result<ScriptReport> {
    let lua = Lua::new();
    let hook_running = Arc::clone(&running);
    lua.set_hook(
        HookTriggers {
            every_nth_instruction: Some(config.hook_interval()),
            ..Default::default()
        },
        move |_, _| {
            if !hook_running.load(Ordering::Acquire) {
                Err(mlua::Error::RuntimeError("script stopped by host".into()))
            } else {
                Ok(())
            }
        },
    );

    let pools = Rc::new(RefCell::new(MathPools::from_config(&config)));
    let context = ScriptContext::new(pose, Rc::clone(&pools));
    register_globals(&lua, &context)?;

    debug!("running script {}", script.name);
    let outcome = lua.load(&script.source).set_name(&script.name).exec();
    // collected userdata goes back to the pools before they are reported
    drop(lua);

    let stats = pools.borrow().stats();
    pools.borrow_mut().reset();
    outcome
        .map_err(anyhow::Error::from)
        .with_context(|| format!("Lua runtime error in {}", script.name))?;
    info!("script {} finished", script.name);
    Ok(ScriptReport {
        name: script.name,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::rig::Rig;
    use once_cell::sync::Lazy;

    static AVATAR_XML: Lazy<String> = Lazy::new(|| {
        r#"<avatar>
  <bone name="Body">
    <bone name="Head"><pivot>0 24 0</pivot></bone>
  </bone>
</avatar>"#
            .to_string()
    });

    fn script(name: &str, source: &str) -> ScriptSource {
        ScriptSource {
            name: name.into(),
            source: source.into(),
        }
    }

    #[test]
    fn script_updates_pose() {
        let rig = Rig::from_xml(&AVATAR_XML).unwrap();
        let pose = PoseModel::from_bones(rig.bones);
        let source = r#"
            local head = avatar.get("Head")
            local r = matrices.y_rotation3(90):apply(vec(1, 0, 0))
            head.rotation = {0, 45, 0}
            head.position = vec(r.x, r.y, r.z)
        "#;
        let mut manager = LuaScriptManager::new(
            vec![script("head.lua", source)],
            pose.clone(),
            MathConfig::default(),
        );
        assert_eq!(manager.start().unwrap(), 1);
        manager.wait().unwrap();

        let head = pose.get("Head").unwrap();
        assert_eq!(head.rotation, Vector3::of(0.0, 45.0, 0.0));
        assert!((head.position - Vector3::of(0.0, 0.0, -1.0)).length() < 1e-12);
        assert_eq!(manager.reports().len(), 1);
        assert_eq!(manager.reports()[0].name, "head.lua");
    }

    #[test]
    fn reports_show_pool_reuse() {
        let source = r#"
            for i = 1, 50 do
                local m = matrices.mat4()
                m:rotate_x(i)
                if i % 10 == 0 then collectgarbage() end
            end
        "#;
        let config = MathConfig::default().with_pool_capacity(8);
        let mut manager =
            LuaScriptManager::new(vec![script("churn.lua", source)], PoseModel::new(), config);
        manager.start().unwrap();
        manager.wait().unwrap();
        let (_, mat4) = manager.reports()[0]
            .stats
            .iter()
            .copied()
            .find(|(name, _)| *name == "mat4")
            .unwrap();
        assert!(mat4.recycled > 0);
        assert_eq!(mat4.created + mat4.recycled, 50);
    }

    #[test]
    fn runtime_errors_name_the_script() {
        let mut manager = LuaScriptManager::new(
            vec![script("bad.lua", "matrices.mat2():get_row(3)")],
            PoseModel::new(),
            MathConfig::default(),
        );
        manager.start().unwrap();
        let err = manager.wait().unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("bad.lua"), "{message}");
        assert!(message.contains("Row must be 1 to 2, got 3"), "{message}");
    }

    #[test]
    fn stop_interrupts_endless_scripts() {
        let mut manager = LuaScriptManager::new(
            vec![script("spin.lua", "while true do end")],
            PoseModel::new(),
            MathConfig::default(),
        );
        manager.start().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let err = manager.stop().unwrap_err();
        assert!(format!("{err:#}").contains("script stopped by host"));
    }
}
