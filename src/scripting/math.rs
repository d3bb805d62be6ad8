//! Lua userdata for pooled vectors, matrices and transform stacks.
//!
//! Every value a script creates is checked out of the context's
//! [`MathPools`] and handed back when Lua collects it. Methods that mutate in
//! place return the receiver so calls chain: `m:transpose():invert()`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use mlua::{
    AnyUserData, FromLua, FromLuaMulti, Function, IntoLua, IntoLuaMulti, Lua, MetaMethod,
    Result as LuaResult, Table, UserData, UserDataFields, UserDataMethods, Value, Variadic,
};

use crate::cache::{CacheStack, MathPools, Pool, Pooled, Stackable};
use crate::error::MathError;
use crate::math::{
    Cofactors, Matrix, Matrix2, Matrix3, Matrix4, Vector, Vector2, Vector3, Vector4,
};

const AXES: [&str; 4] = ["x", "y", "z", "w"];

pub(crate) fn lua_error(err: MathError) -> mlua::Error {
    mlua::Error::RuntimeError(err.to_string())
}

/// Weak handle to the pools of one script context.
///
/// Values outliving their context fall back to a zero-capacity pool, so they
/// are still created and dropped normally.
#[derive(Debug, Clone)]
pub(crate) struct PoolRef(Weak<RefCell<MathPools>>);

impl PoolRef {
    pub(crate) fn new(pools: &Rc<RefCell<MathPools>>) -> Self {
        Self(Rc::downgrade(pools))
    }

    fn with_pool<T: Pooled, R>(&self, f: impl FnOnce(&mut Pool<T>) -> R) -> R {
        if let Some(pools) = self.0.upgrade() {
            if let Ok(mut guard) = pools.try_borrow_mut() {
                return f(guard.pool_mut::<T>());
            }
        }
        f(&mut Pool::new(0))
    }

    fn checkout_copy<T: Pooled + Stackable>(&self, source: &T) -> T {
        self.with_pool(|pool: &mut Pool<T>| {
            let mut value = pool.get_fresh();
            value.copy_from(source);
            value
        })
    }

    fn give_back<T: Pooled>(&self, value: T) {
        self.with_pool(|pool: &mut Pool<T>| {
            pool.release(value);
        });
    }

    pub(crate) fn matrix<const N: usize>(&self, source: &Matrix<N>) -> LuaMatrix<N>
    where
        Matrix<N>: Pooled,
    {
        LuaMatrix {
            value: self.checkout_copy(source),
            pools: self.clone(),
        }
    }

    pub(crate) fn vector<const N: usize>(&self, source: &Vector<N>) -> LuaVector<N>
    where
        Vector<N>: Pooled,
    {
        LuaVector {
            value: self.checkout_copy(source),
            pools: self.clone(),
        }
    }
}

/// Registers `vectors`, `vec` and `matrices`.
pub(crate) fn register_math(lua: &Lua, pools: &PoolRef) -> LuaResult<()> {
    let globals = lua.globals();

    let vectors = lua.create_table()?;
    vectors.set(
        "vec2",
        constructor(lua, pools, |_, pools, (x, y): (Option<f64>, Option<f64>)| {
            Ok(pools.vector(&Vector2::of(x.unwrap_or(0.0), y.unwrap_or(0.0))))
        })?,
    )?;
    vectors.set(
        "vec3",
        constructor(
            lua,
            pools,
            |_, pools, (x, y, z): (Option<f64>, Option<f64>, Option<f64>)| {
                Ok(pools.vector(&Vector3::of(
                    x.unwrap_or(0.0),
                    y.unwrap_or(0.0),
                    z.unwrap_or(0.0),
                )))
            },
        )?,
    )?;
    vectors.set(
        "vec4",
        constructor(
            lua,
            pools,
            |_, pools, (x, y, z, w): (Option<f64>, Option<f64>, Option<f64>, Option<f64>)| {
                Ok(pools.vector(&Vector4::of(
                    x.unwrap_or(0.0),
                    y.unwrap_or(0.0),
                    z.unwrap_or(0.0),
                    w.unwrap_or(0.0),
                )))
            },
        )?,
    )?;
    globals.set("vectors", vectors)?;

    globals.set(
        "vec",
        constructor(lua, pools, |lua, pools, values: Variadic<f64>| {
            match values.len() {
                2 => pools.vector(&Vector2::of(values[0], values[1])).into_lua(lua),
                3 => pools
                    .vector(&Vector3::of(values[0], values[1], values[2]))
                    .into_lua(lua),
                4 => pools
                    .vector(&Vector4::of(values[0], values[1], values[2], values[3]))
                    .into_lua(lua),
                got => Err(mlua::Error::RuntimeError(format!(
                    "vec expects 2 to 4 components, got {got}"
                ))),
            }
        })?,
    )?;

    let matrices = lua.create_table()?;
    matrices.set(
        "mat2",
        constructor(lua, pools, |_, pools, columns: Variadic<VectorArg<2>>| {
            Ok(pools.matrix(&columns_matrix(&columns)?))
        })?,
    )?;
    matrices.set(
        "mat3",
        constructor(lua, pools, |_, pools, columns: Variadic<VectorArg<3>>| {
            Ok(pools.matrix(&columns_matrix(&columns)?))
        })?,
    )?;
    matrices.set(
        "mat4",
        constructor(lua, pools, |_, pools, columns: Variadic<VectorArg<4>>| {
            Ok(pools.matrix(&columns_matrix(&columns)?))
        })?,
    )?;

    matrices.set(
        "scale2",
        constructor(lua, pools, |_, pools, (x, y): (f64, f64)| {
            Ok(pools.matrix(&Matrix2::create_scale_matrix(x, y)))
        })?,
    )?;
    matrices.set(
        "scale3",
        constructor(lua, pools, |_, pools, (x, y, z): (f64, f64, f64)| {
            Ok(pools.matrix(&Matrix3::create_scale_matrix(x, y, z)))
        })?,
    )?;
    matrices.set(
        "scale4",
        constructor(lua, pools, |_, pools, (x, y, z): (f64, f64, f64)| {
            Ok(pools.matrix(&Matrix4::create_scale_matrix(x, y, z)))
        })?,
    )?;

    matrices.set(
        "rotation2",
        constructor(lua, pools, |_, pools, degrees: f64| {
            Ok(pools.matrix(&Matrix2::create_rotation_matrix(degrees)))
        })?,
    )?;
    matrices.set(
        "rotation3",
        constructor(lua, pools, |_, pools, (x, y, z): (f64, f64, f64)| {
            Ok(pools.matrix(&Matrix3::create_zyx_rotation_matrix(x, y, z)))
        })?,
    )?;
    matrices.set(
        "rotation4",
        constructor(lua, pools, |_, pools, (x, y, z): (f64, f64, f64)| {
            Ok(pools.matrix(&Matrix4::create_zyx_rotation_matrix(x, y, z)))
        })?,
    )?;

    let axis_rotations3: [(&str, fn(f64) -> Matrix3); 3] = [
        ("x_rotation3", Matrix3::create_x_rotation_matrix),
        ("y_rotation3", Matrix3::create_y_rotation_matrix),
        ("z_rotation3", Matrix3::create_z_rotation_matrix),
    ];
    for (name, create) in axis_rotations3 {
        matrices.set(
            name,
            constructor(lua, pools, move |_, pools, degrees: f64| {
                Ok(pools.matrix(&create(degrees)))
            })?,
        )?;
    }
    let axis_rotations4: [(&str, fn(f64) -> Matrix4); 3] = [
        ("x_rotation4", Matrix4::create_x_rotation_matrix),
        ("y_rotation4", Matrix4::create_y_rotation_matrix),
        ("z_rotation4", Matrix4::create_z_rotation_matrix),
    ];
    for (name, create) in axis_rotations4 {
        matrices.set(
            name,
            constructor(lua, pools, move |_, pools, degrees: f64| {
                Ok(pools.matrix(&create(degrees)))
            })?,
        )?;
    }

    matrices.set(
        "translate3",
        constructor(lua, pools, |_, pools, (x, y): (f64, f64)| {
            Ok(pools.matrix(&Matrix3::create_translation_matrix(x, y)))
        })?,
    )?;
    matrices.set(
        "translate4",
        constructor(lua, pools, |_, pools, (x, y, z): (f64, f64, f64)| {
            Ok(pools.matrix(&Matrix4::create_translation_matrix(x, y, z)))
        })?,
    )?;

    matrices.set(
        "stack",
        constructor(lua, pools, |_, pools, ()| {
            Ok(LuaStack {
                frames: CacheStack::new(),
                pools: pools.clone(),
            })
        })?,
    )?;
    globals.set("matrices", matrices)?;

    Ok(())
}

fn constructor<'lua, A, R, F>(lua: &'lua Lua, pools: &PoolRef, build: F) -> LuaResult<Function<'lua>>
where
    A: FromLuaMulti<'lua>,
    R: IntoLuaMulti<'lua>,
    F: Fn(&'lua Lua, &PoolRef, A) -> LuaResult<R> + 'static,
{
    let pools = pools.clone();
    lua.create_function(move |lua, args: A| build(lua, &pools, args))
}

fn columns_matrix<const N: usize>(columns: &[VectorArg<N>]) -> LuaResult<Matrix<N>> {
    if columns.is_empty() {
        return Ok(Matrix::identity());
    }
    let columns: [Vector<N>; N] = columns
        .iter()
        .map(|column| column.0)
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|rest: Vec<Vector<N>>| {
            lua_error(MathError::ColumnCount {
                expected: N,
                got: rest.len(),
            })
        })?;
    Ok(Matrix::from_columns(columns))
}

/// Vector argument given as userdata, `{x=, y=, ...}` or `{1, 2, ...}`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VectorArg<const N: usize>(pub Vector<N>);

impl<'lua, const N: usize> FromLua<'lua> for VectorArg<N>
where
    Vector<N>: Pooled,
{
    fn from_lua(value: Value<'lua>, _: &'lua Lua) -> LuaResult<Self> {
        match value {
            Value::Table(table) => table_vector(&table).map(Self),
            Value::UserData(ud) => ud.borrow::<LuaVector<N>>().map(|vector| Self(vector.value)),
            _ => Err(mlua::Error::FromLuaConversionError {
                from: value.type_name(),
                to: "vector",
                message: Some(format!("expected a {}-component vector or table", N)),
            }),
        }
    }
}

fn table_vector<const N: usize>(table: &Table) -> LuaResult<Vector<N>> {
    let mut components = [0.0; N];
    for (index, component) in components.iter_mut().enumerate() {
        *component = table_component(table, AXES[index], index + 1)?;
    }
    Ok(Vector::from_array(components))
}

fn table_component(table: &Table, key: &str, index: usize) -> LuaResult<f64> {
    if let Ok(value) = table.get::<_, f64>(key) {
        return Ok(value);
    }
    table.get::<_, f64>(index)
}

fn matrix_value<const N: usize>(ud: &AnyUserData) -> LuaResult<Matrix<N>>
where
    Matrix<N>: Pooled,
{
    Ok(ud.borrow::<LuaMatrix<N>>()?.value.copy())
}

/// Methods that only exist for one dimension.
pub trait DimensionMethods: Sized {
    fn add_dimension_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M);
}

type MatrixMutator<const N: usize> = fn(&mut Matrix<N>);

fn zero_arg_mutators<const N: usize>() -> [(&'static str, MatrixMutator<N>); 3]
where
    Matrix<N>: Cofactors<N>,
{
    [
        ("transpose", |m| {
            m.transpose();
        }),
        ("invert", |m| {
            m.invert();
        }),
        ("reset", |m| {
            m.reset();
        }),
    ]
}

/// Applied to a pooled copy of the receiver.
fn derivations<const N: usize>() -> [(&'static str, MatrixMutator<N>); 3]
where
    Matrix<N>: Cofactors<N>,
{
    [
        ("copy", |_| {}),
        ("transposed", |out| {
            out.transpose();
        }),
        ("inverted", |out| {
            out.invert();
        }),
    ]
}

/// Pooled matrix owned by Lua.
#[derive(Debug)]
pub struct LuaMatrix<const N: usize>
where
    Matrix<N>: Pooled,
{
    value: Matrix<N>,
    pools: PoolRef,
}

impl<const N: usize> LuaMatrix<N>
where
    Matrix<N>: Pooled,
{
    pub fn value(&self) -> &Matrix<N> {
        &self.value
    }
}

impl<const N: usize> Drop for LuaMatrix<N>
where
    Matrix<N>: Pooled,
{
    fn drop(&mut self) {
        self.pools.give_back(std::mem::take(&mut self.value));
    }
}

impl<const N: usize> UserData for LuaMatrix<N>
where
    Matrix<N>: Cofactors<N> + Pooled,
    Vector<N>: Pooled,
    LuaMatrix<N>: DimensionMethods,
    LuaVector<N>: UserData,
{
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_field_method_get("size", |_, _| Ok(N));
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        for (name, mutate) in zero_arg_mutators::<N>() {
            methods.add_function(name, move |_, ud: AnyUserData| {
                mutate(&mut ud.borrow_mut::<Self>()?.value);
                Ok(ud)
            });
        }
        for (name, derive) in derivations::<N>() {
            methods.add_method(name, move |_, this, ()| {
                let mut out = this.pools.matrix(&this.value);
                derive(&mut out.value);
                Ok(out)
            });
        }

        methods.add_function("set", |_, (ud, other): (AnyUserData, AnyUserData)| {
            let other = matrix_value::<N>(&other)?;
            ud.borrow_mut::<Self>()?.value.set(&other);
            Ok(ud)
        });
        methods.add_function("multiply", |_, (ud, other): (AnyUserData, AnyUserData)| {
            let other = matrix_value::<N>(&other)?;
            ud.borrow_mut::<Self>()?.value.multiply(&other);
            Ok(ud)
        });
        methods.add_function(
            "right_multiply",
            |_, (ud, other): (AnyUserData, AnyUserData)| {
                let other = matrix_value::<N>(&other)?;
                ud.borrow_mut::<Self>()?.value.right_multiply(&other);
                Ok(ud)
            },
        );
        methods.add_function(
            "set_entry",
            |_, (ud, row, col, value): (AnyUserData, i64, i64, f64)| {
                ud.borrow_mut::<Self>()?
                    .value
                    .set_entry(row, col, value)
                    .map_err(lua_error)?;
                Ok(ud)
            },
        );

        methods.add_method("det", |_, this, ()| Ok(this.value.det()));
        methods.add_method("entry", |_, this, (row, col): (i64, i64)| {
            this.value.entry(row, col).map_err(lua_error)
        });
        methods.add_method("get_row", |_, this, row: i64| {
            let row = this.value.get_row(row).map_err(lua_error)?;
            Ok(this.pools.vector(&row))
        });
        methods.add_method("get_column", |_, this, col: i64| {
            let col = this.value.get_column(col).map_err(lua_error)?;
            Ok(this.pools.vector(&col))
        });
        methods.add_method("apply", |_, this, v: VectorArg<N>| {
            Ok(this.pools.vector(&this.value.apply(&v.0)))
        });

        methods.add_meta_method(MetaMethod::Mul, |lua, this, rhs: AnyUserData| {
            if let Ok(vector) = rhs.borrow::<LuaVector<N>>() {
                return this.pools.vector(&this.value.apply(&vector.value)).into_lua(lua);
            }
            let rhs = rhs.borrow::<Self>()?;
            this.pools.matrix(&(&this.value * &rhs.value)).into_lua(lua)
        });
        methods.add_meta_method(MetaMethod::Add, |_, this, rhs: AnyUserData| {
            let mut out = this.pools.matrix(&this.value);
            out.value.add(&rhs.borrow::<Self>()?.value);
            Ok(out)
        });
        methods.add_meta_method(MetaMethod::Sub, |_, this, rhs: AnyUserData| {
            let mut out = this.pools.matrix(&this.value);
            out.value.sub(&rhs.borrow::<Self>()?.value);
            Ok(out)
        });
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: AnyUserData| {
            Ok(other
                .borrow::<Self>()
                .map(|other| other.value == this.value)
                .unwrap_or(false))
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(this.value.to_string())
        });

        Self::add_dimension_methods(methods);
    }
}

impl DimensionMethods for LuaMatrix<2> {
    fn add_dimension_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_function("scale", |_, (ud, x, y): (AnyUserData, f64, f64)| {
            ud.borrow_mut::<Self>()?.value.scale(x, y);
            Ok(ud)
        });
        methods.add_function("rotate", |_, (ud, degrees): (AnyUserData, f64)| {
            ud.borrow_mut::<Self>()?.value.rotate(degrees);
            Ok(ud)
        });
        methods.add_method("augmented", |_, this, ()| {
            Ok(this.pools.matrix(&this.value.augmented()))
        });
    }
}

impl DimensionMethods for LuaMatrix<3> {
    fn add_dimension_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_function("scale", |_, (ud, x, y, z): (AnyUserData, f64, f64, f64)| {
            ud.borrow_mut::<Self>()?.value.scale(x, y, z);
            Ok(ud)
        });
        methods.add_function("translate", |_, (ud, x, y): (AnyUserData, f64, f64)| {
            ud.borrow_mut::<Self>()?.value.translate(x, y);
            Ok(ud)
        });
        let axes: [(&str, fn(&mut Matrix3, f64)); 3] = [
            ("rotate_x", |m, degrees| {
                m.rotate_x(degrees);
            }),
            ("rotate_y", |m, degrees| {
                m.rotate_y(degrees);
            }),
            ("rotate_z", |m, degrees| {
                m.rotate_z(degrees);
            }),
        ];
        for (name, rotate) in axes {
            methods.add_function(name, move |_, (ud, degrees): (AnyUserData, f64)| {
                rotate(&mut ud.borrow_mut::<Self>()?.value, degrees);
                Ok(ud)
            });
        }
        methods.add_function(
            "rotate_zyx",
            |_, (ud, x, y, z): (AnyUserData, f64, f64, f64)| {
                ud.borrow_mut::<Self>()?.value.rotate_zyx(x, y, z);
                Ok(ud)
            },
        );
        methods.add_method("augmented", |_, this, ()| {
            Ok(this.pools.matrix(&this.value.augmented()))
        });
        methods.add_method("deaugmented", |_, this, ()| {
            Ok(this.pools.matrix(&this.value.deaugmented()))
        });
    }
}

impl DimensionMethods for LuaMatrix<4> {
    fn add_dimension_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_function("scale", |_, (ud, x, y, z): (AnyUserData, f64, f64, f64)| {
            ud.borrow_mut::<Self>()?.value.scale(x, y, z);
            Ok(ud)
        });
        methods.add_function(
            "translate",
            |_, (ud, x, y, z): (AnyUserData, f64, f64, f64)| {
                ud.borrow_mut::<Self>()?.value.translate(x, y, z);
                Ok(ud)
            },
        );
        let axes: [(&str, fn(&mut Matrix4, f64)); 3] = [
            ("rotate_x", |m, degrees| {
                m.rotate_x(degrees);
            }),
            ("rotate_y", |m, degrees| {
                m.rotate_y(degrees);
            }),
            ("rotate_z", |m, degrees| {
                m.rotate_z(degrees);
            }),
        ];
        for (name, rotate) in axes {
            methods.add_function(name, move |_, (ud, degrees): (AnyUserData, f64)| {
                rotate(&mut ud.borrow_mut::<Self>()?.value, degrees);
                Ok(ud)
            });
        }
        methods.add_function(
            "rotate_zyx",
            |_, (ud, x, y, z): (AnyUserData, f64, f64, f64)| {
                ud.borrow_mut::<Self>()?.value.rotate_zyx(x, y, z);
                Ok(ud)
            },
        );
        methods.add_method("deaugmented", |_, this, ()| {
            Ok(this.pools.matrix(&this.value.deaugmented()))
        });
        methods.add_method("apply_point", |_, this, point: VectorArg<3>| {
            Ok(this.pools.vector(&this.value.apply_point(&point.0)))
        });
        methods.add_method("apply_dir", |_, this, dir: VectorArg<3>| {
            Ok(this.pools.vector(&this.value.apply_dir(&dir.0)))
        });
    }
}

/// Pooled vector owned by Lua.
#[derive(Debug)]
pub struct LuaVector<const N: usize>
where
    Vector<N>: Pooled,
{
    value: Vector<N>,
    pools: PoolRef,
}

impl<const N: usize> LuaVector<N>
where
    Vector<N>: Pooled,
{
    pub fn value(&self) -> Vector<N> {
        self.value
    }
}

impl<const N: usize> Drop for LuaVector<N>
where
    Vector<N>: Pooled,
{
    fn drop(&mut self) {
        self.pools.give_back(std::mem::take(&mut self.value));
    }
}

impl<const N: usize> UserData for LuaVector<N>
where
    Vector<N>: Pooled,
    LuaVector<N>: DimensionMethods,
{
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        for (index, axis) in AXES.into_iter().enumerate().take(N) {
            fields.add_field_method_get(axis, move |_, this| Ok(this.value.at(index)));
            fields.add_field_method_set(axis, move |_, this, value: f64| {
                *this.value.at_mut(index) = value;
                Ok(())
            });
        }
        fields.add_field_method_get("size", |_, _| Ok(N));
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("get", |_, this, index: i64| {
            this.value.get(index).map_err(lua_error)
        });
        methods.add_method("length", |_, this, ()| Ok(this.value.length()));
        methods.add_method("dot", |_, this, other: VectorArg<N>| {
            Ok(this.value.dot(&other.0))
        });
        methods.add_method("copy", |_, this, ()| Ok(this.pools.vector(&this.value)));
        methods.add_method("normalized", |_, this, ()| {
            Ok(this.pools.vector(&this.value.normalized()))
        });
        methods.add_function("normalize", |_, ud: AnyUserData| {
            ud.borrow_mut::<Self>()?.value.normalize();
            Ok(ud)
        });
        methods.add_function("reset", |_, ud: AnyUserData| {
            ud.borrow_mut::<Self>()?.value.reset();
            Ok(ud)
        });
        methods.add_function("set", |_, (ud, other): (AnyUserData, VectorArg<N>)| {
            ud.borrow_mut::<Self>()?.value.set(&other.0);
            Ok(ud)
        });

        methods.add_meta_method(MetaMethod::Add, |_, this, rhs: VectorArg<N>| {
            Ok(this.pools.vector(&(this.value + rhs.0)))
        });
        methods.add_meta_method(MetaMethod::Sub, |_, this, rhs: VectorArg<N>| {
            Ok(this.pools.vector(&(this.value - rhs.0)))
        });
        // `v * 2` and `2 * v` both land here, with the vector on either side
        methods.add_meta_function(MetaMethod::Mul, |lua, (lhs, rhs): (Value, Value)| {
            let (ud, factor) = match (lhs, rhs) {
                (Value::UserData(ud), factor) if !matches!(factor, Value::UserData(_)) => {
                    (ud, factor)
                }
                (factor, Value::UserData(ud)) => (ud, factor),
                _ => {
                    return Err(mlua::Error::RuntimeError(
                        "vector multiplication needs a vector operand".into(),
                    ))
                }
            };
            let factor = f64::from_lua(factor, lua)?;
            let this = ud.borrow::<Self>()?;
            Ok(this.pools.vector(&(this.value * factor)))
        });
        methods.add_meta_method(MetaMethod::Unm, |_, this, ()| {
            Ok(this.pools.vector(&-this.value))
        });
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: AnyUserData| {
            Ok(other
                .borrow::<Self>()
                .map(|other| other.value == this.value)
                .unwrap_or(false))
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(this.value.to_string())
        });

        Self::add_dimension_methods(methods);
    }
}

impl DimensionMethods for LuaVector<2> {
    fn add_dimension_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("augmented", |_, this, ()| {
            Ok(this.pools.vector(&this.value.augmented()))
        });
    }
}

impl DimensionMethods for LuaVector<3> {
    fn add_dimension_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("cross", |_, this, other: VectorArg<3>| {
            Ok(this.pools.vector(&this.value.cross(&other.0)))
        });
        methods.add_method("augmented", |_, this, ()| {
            Ok(this.pools.vector(&this.value.augmented()))
        });
    }
}

impl DimensionMethods for LuaVector<4> {
    fn add_dimension_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("truncated", |_, this, ()| {
            Ok(this.pools.vector(&this.value.truncated()))
        });
    }
}

/// 4×4 transform stack created by `matrices.stack()`.
#[derive(Debug)]
pub struct LuaStack {
    frames: CacheStack<Matrix4>,
    pools: PoolRef,
}

impl Drop for LuaStack {
    fn drop(&mut self) {
        let LuaStack { frames, pools } = self;
        pools.with_pool(|pool: &mut Pool<Matrix4>| frames.clear(pool));
    }
}

impl UserData for LuaStack {
    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_function("push", |_, ud: AnyUserData| {
            {
                let mut stack = ud.borrow_mut::<Self>()?;
                let LuaStack { frames, pools } = &mut *stack;
                pools.with_pool(|pool: &mut Pool<Matrix4>| frames.push(pool));
            }
            Ok(ud)
        });
        methods.add_function("pop", |_, ud: AnyUserData| {
            {
                let mut stack = ud.borrow_mut::<Self>()?;
                let LuaStack { frames, pools } = &mut *stack;
                pools
                    .with_pool(|pool: &mut Pool<Matrix4>| frames.try_pop(pool))
                    .map_err(lua_error)?;
            }
            Ok(ud)
        });
        methods.add_function("modify", |_, (ud, arg): (AnyUserData, AnyUserData)| {
            let arg = matrix_value::<4>(&arg)?;
            ud.borrow_mut::<Self>()?
                .frames
                .modify(&arg)
                .map_err(lua_error)?;
            Ok(ud)
        });
        methods.add_method("peek", |_, this, ()| {
            Ok(this.frames.peek().map(|top| this.pools.matrix(top)))
        });
        methods.add_method("depth", |_, this, ()| Ok(this.frames.depth()));
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("stack(depth={})", this.frames.depth()))
        });
    }
}
