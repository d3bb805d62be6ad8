//! Plain-text summaries printed by the command line tool.

use crate::math::Vector3;
use crate::pose::PoseModel;
use crate::scripting::ScriptReport;
use crate::skeleton::BoneTransform;

fn triple(v: &Vector3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x(), v.y(), v.z())
}

pub fn print_final_state(pose: &PoseModel) {
    println!("Final bone states:");
    for bone in pose.all_bones() {
        println!(
            " - {} pos={} rot={} scale={}",
            bone.name,
            triple(&bone.position),
            triple(&bone.rotation),
            triple(&bone.scale)
        );
    }
}

pub fn print_world_matrices(transforms: &[BoneTransform]) {
    println!("World matrices:");
    for transform in transforms {
        println!(" - {}", transform.name);
        for line in transform.world.to_string().lines() {
            println!("     {line}");
        }
    }
}

pub fn print_script_reports(reports: &[ScriptReport]) {
    for report in reports {
        let used: Vec<String> = report
            .stats
            .iter()
            .filter(|(_, stats)| stats.created + stats.recycled > 0)
            .map(|(name, stats)| format!("{name} {}/{}", stats.created, stats.recycled))
            .collect();
        if used.is_empty() {
            println!("Script {}: no pooled values", report.name);
        } else {
            println!(
                "Script {}: created/recycled {}",
                report.name,
                used.join(", ")
            );
        }
    }
}
