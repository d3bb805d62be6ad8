use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};

use avatar_math::report::{print_final_state, print_script_reports, print_world_matrices};
use avatar_math::{world_transforms, LuaScriptManager, MathConfig, MathPools, PoseModel, Rig};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read avatar {}", options.path))?;
    let rig = Rig::from_xml(&xml).context("failed to parse avatar XML")?;

    println!(
        "Loaded avatar with {} bones ({} scripts)",
        rig.bones.len(),
        rig.scripts.len()
    );
    for bone in &rig.bones {
        match &bone.parent {
            Some(parent) => println!(" - {} (child of {parent})", bone.name),
            None => println!(" - {} (root)", bone.name),
        }
    }

    let pose = PoseModel::from_bones(rig.bones.clone());
    if options.run_scripts {
        println!("Starting Lua scripts...");
        let mut manager =
            LuaScriptManager::new(rig.scripts.clone(), pose.clone(), options.config.clone());
        let count = manager.start().context("failed to launch scripts")?;
        println!("Launched {count} script(s)");
        manager.wait().context("script execution failed")?;
        print_script_reports(manager.reports());
    }

    print_final_state(&pose);

    if options.print_matrices {
        let mut pools = MathPools::from_config(&options.config);
        let transforms = world_transforms(&pose, &mut pools)?;
        print_world_matrices(&transforms);
    }
    Ok(())
}

struct CliOptions {
    path: String,
    run_scripts: bool,
    print_matrices: bool,
    config: MathConfig,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: avatar-math <avatar.xml> [--run-scripts] [--print-matrices] [--pool-capacity N]"
            ));
        };
        let mut run_scripts = false;
        let mut print_matrices = false;
        let mut config = MathConfig::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--run-scripts" => run_scripts = true,
                "--print-matrices" => print_matrices = true,
                "--pool-capacity" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--pool-capacity needs a value"))?;
                    let capacity = value
                        .parse()
                        .with_context(|| format!("invalid pool capacity {value:?}"))?;
                    config = config.with_pool_capacity(capacity);
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --run-scripts, --print-matrices or --pool-capacity"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            run_scripts,
            print_matrices,
            config,
        })
    }
}
