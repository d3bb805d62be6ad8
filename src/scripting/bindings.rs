use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use mlua::{
    Function, Lua, LuaSerdeExt, MultiValue, Result as LuaResult, Table, UserData,
    UserDataFields, UserDataMethods, Value, Variadic,
};

use crate::cache::MathPools;
use crate::math::{Matrix4, Vector3};
use crate::pose::PoseModel;
use crate::rig::Bone;

use super::math::{register_math, PoolRef, VectorArg};

/// Host state one Lua state is allowed to reach.
pub(super) struct ScriptContext {
    pub pose: PoseModel,
    pub pools: Rc<RefCell<MathPools>>,
}

impl ScriptContext {
    pub fn new(pose: PoseModel, pools: Rc<RefCell<MathPools>>) -> Self {
        Self { pose, pools }
    }

    fn pool_ref(&self) -> PoolRef {
        PoolRef::new(&self.pools)
    }
}

pub(super) fn register_globals(lua: &Lua, context: &ScriptContext) -> LuaResult<()> {
    debug!("registering script globals");
    register_print(lua)?;
    register_math(lua, &context.pool_ref())?;
    register_avatar(lua, context)?;
    Ok(())
}

fn register_print(lua: &Lua) -> LuaResult<()> {
    let print = lua.create_function(|lua, values: Variadic<Value>| {
        let mut out = Vec::new();
        for value in values.iter() {
            let text = match value {
                Value::Nil => "nil".to_string(),
                Value::Boolean(b) => b.to_string(),
                Value::String(s) => s.to_str()?.to_string(),
                Value::UserData(_) => {
                    let tostring: Function = lua.globals().get("tostring")?;
                    tostring.call::<_, String>(value.clone())?
                }
                _ => match lua.coerce_string(value.clone())? {
                    Some(s) => s.to_str()?.to_string(),
                    None => format!("{:?}", value),
                },
            };
            out.push(text);
        }
        println!("[Lua] {}", out.join("\t"));
        Ok(())
    })?;
    lua.globals().set("print", print)?;
    Ok(())
}

fn register_avatar(lua: &Lua, context: &ScriptContext) -> LuaResult<()> {
    let table = lua.create_table()?;

    let index_pose = context.pose.clone();
    let index_pools = context.pool_ref();
    let index_fn = lua.create_function(move |lua, (_avatar, key): (Table, String)| {
        bone_handle(lua, &index_pose, &index_pools, key)
    })?;
    let metatable = lua.create_table()?;
    metatable.set("__index", index_fn)?;
    table.set_metatable(Some(metatable));

    let get_pose = context.pose.clone();
    let get_pools = context.pool_ref();
    let get_fn = lua.create_function(move |lua, args: MultiValue| {
        let Some(name) = string_argument(&args)? else {
            return Err(mlua::Error::FromLuaConversionError {
                from: "value",
                to: "string",
                message: Some("expected bone name".into()),
            });
        };
        bone_handle(lua, &get_pose, &get_pools, name)
    })?;
    table.set("get", get_fn)?;

    let names_pose = context.pose.clone();
    let names = lua.create_function(move |lua, ()| {
        let names = names_pose.names();
        let result = lua.create_table_with_capacity(names.len(), 0)?;
        for (index, name) in names.into_iter().enumerate() {
            result.set(index + 1, name)?;
        }
        Ok::<_, mlua::Error>(result)
    })?;
    table.set("names", names)?;

    let describe_pose = context.pose.clone();
    let describe = lua.create_function(move |lua, name: String| {
        match describe_pose.get(&name) {
            Some(bone) => lua.to_value(&bone),
            None => Ok(Value::Nil),
        }
    })?;
    table.set("describe", describe)?;

    lua.globals().set("avatar", table)?;
    Ok(())
}

fn bone_handle<'lua>(
    lua: &'lua Lua,
    pose: &PoseModel,
    pools: &PoolRef,
    name: String,
) -> LuaResult<Value<'lua>> {
    if name.is_empty() || !pose.contains(&name) {
        return Ok(Value::Nil);
    }
    let handle = BoneHandle {
        pose: pose.clone(),
        pools: pools.clone(),
        name,
    };
    Ok(Value::UserData(lua.create_userdata(handle)?))
}

fn string_argument(values: &MultiValue) -> LuaResult<Option<String>> {
    for value in values.iter() {
        if let Value::String(s) = value {
            return Ok(Some(s.to_str()?.to_string()));
        }
    }
    Ok(None)
}

/// Live view of one bone in the shared pose.
struct BoneHandle {
    pose: PoseModel,
    pools: PoolRef,
    name: String,
}

impl BoneHandle {
    fn read(&self, field: fn(&Bone) -> Vector3) -> Option<Vector3> {
        self.pose.get(&self.name).map(|bone| field(&bone))
    }
}

impl UserData for BoneHandle {
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_field_method_get("name", |_, this| Ok(this.name.clone()));
        fields.add_field_method_get("parent", |_, this| {
            Ok(this.pose.get(&this.name).and_then(|bone| bone.parent))
        });

        let accessors: [(&str, fn(&Bone) -> Vector3); 4] = [
            ("pivot", |bone| bone.pivot),
            ("position", |bone| bone.position),
            ("rotation", |bone| bone.rotation),
            ("scale", |bone| bone.scale),
        ];
        for (name, field) in accessors {
            fields.add_field_method_get(name, move |_, this| {
                Ok(this.read(field).map(|value| this.pools.vector(&value)))
            });
        }

        fields.add_field_method_set("pivot", |_, this, value: VectorArg<3>| {
            this.pose.set_pivot(&this.name, value.0);
            Ok(())
        });
        fields.add_field_method_set("position", |_, this, value: VectorArg<3>| {
            this.pose.set_position(&this.name, value.0);
            Ok(())
        });
        fields.add_field_method_set("rotation", |_, this, value: VectorArg<3>| {
            this.pose.set_rotation(&this.name, value.0);
            Ok(())
        });
        fields.add_field_method_set("scale", |_, this, value: VectorArg<3>| {
            this.pose.set_scale(&this.name, value.0);
            Ok(())
        });
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("get_matrix", |_, this, ()| {
            let Some(bone) = this.pose.get(&this.name) else {
                return Ok(None);
            };
            let mut local = Matrix4::identity();
            bone.write_local_matrix(&mut local);
            Ok(Some(this.pools.matrix(&local)))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(bones: Vec<Bone>) -> (Lua, PoseModel, Rc<RefCell<MathPools>>) {
        let lua = Lua::new();
        let pose = PoseModel::from_bones(bones);
        let pools = Rc::new(RefCell::new(MathPools::new(16)));
        let context = ScriptContext::new(pose.clone(), Rc::clone(&pools));
        register_globals(&lua, &context).unwrap();
        (lua, pose, pools)
    }

    #[test]
    fn bone_fields_read_and_write_the_pose() {
        let mut head = Bone::new("Head");
        head.parent = Some("Body".into());
        let (lua, pose, _pools) = setup(vec![Bone::new("Body"), head]);

        let (scale_y, parent, count): (f64, String, i64) = lua
            .load(
                r#"
                local head = avatar.get("Head")
                assert(head ~= nil, "head should exist")
                head.rotation = vec(0, 90, 0)
                head.position = {x = 1, y = 2, z = 3}
                return head.scale.y, head.parent, #avatar.names()
            "#,
            )
            .eval()
            .unwrap();

        assert_eq!(scale_y, 1.0);
        assert_eq!(parent, "Body");
        assert_eq!(count, 2);
        let updated = pose.get("Head").unwrap();
        assert_eq!(updated.rotation, Vector3::of(0.0, 90.0, 0.0));
        assert_eq!(updated.position, Vector3::of(1.0, 2.0, 3.0));
    }

    #[test]
    fn describe_returns_plain_tables() {
        let mut arm = Bone::new("Arm");
        arm.parent = Some("Body".into());
        arm.rotation = Vector3::of(0.0, 0.0, 30.0);
        let (lua, _pose, _pools) = setup(vec![Bone::new("Body"), arm]);
        let (parent, rot_z, scale_x): (String, f64, f64) = lua
            .load(
                r#"
                local arm = avatar.describe("Arm")
                return arm.parent, arm.rotation[3], arm.scale[1]
            "#,
            )
            .eval()
            .unwrap();
        assert_eq!(parent, "Body");
        assert_eq!(rot_z, 30.0);
        assert_eq!(scale_x, 1.0);
    }

    #[test]
    fn unknown_bones_are_nil() {
        let (lua, _pose, _pools) = setup(vec![Bone::new("Body")]);
        let (by_index, by_get): (bool, bool) = lua
            .load("return avatar.Tail == nil, avatar.get('Tail') == nil")
            .eval()
            .unwrap();
        assert!(by_index);
        assert!(by_get);
    }

    #[test]
    fn bone_matrix_matches_local_transform() {
        let mut arm = Bone::new("Arm");
        arm.position = Vector3::of(4.0, 0.0, 0.0);
        let (lua, _pose, _pools) = setup(vec![arm]);
        let (x, y, z): (f64, f64, f64) = lua
            .load(
                r#"
                local p = avatar.Arm:get_matrix():apply_point({0, 0, 0})
                return p.x, p.y, p.z
            "#,
            )
            .eval()
            .unwrap();
        assert_eq!((x, y, z), (4.0, 0.0, 0.0));
    }

    #[test]
    fn script_errors_carry_the_valid_range() {
        let (lua, _pose, _pools) = setup(Vec::new());
        let message: String = lua
            .load(
                r#"
                local ok, err = pcall(function()
                    return matrices.mat3():get_column(0)
                end)
                return tostring(err)
            "#,
            )
            .eval()
            .unwrap();
        assert!(message.contains("Column must be 1 to 3, got 0"), "{message}");
    }
}
