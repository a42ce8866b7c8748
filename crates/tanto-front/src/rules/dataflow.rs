//! Dataflow-kernel rules: local/pipe transfers over the NoC, semaphores,
//! and barriers.
//!
//! Element offsets and counts are shifted into bytes by the element size of
//! the templated `self` type (1 for bfloat16, 2 for uint32/float). The
//! source/destination flavor is picked from the type of the second
//! argument: `global` (with distribution and DRAM traits), `local`, or
//! `pipe`.

use tree_sitter::Node;

use crate::tooling::rewrite::{Edit, Rule, RuleCx};
use crate::tooling::types::DataKind;

use super::{MemberMatch, RuleFactory, access, expr_class, expr_global, match_func_call,
    match_member_call, replace_stmt, shifted, text};

const CAST_PTR_U32: &str = "reinterpret_cast<volatile tt_l1_ptr uint32_t *>";

/// How the matched pipe or local addresses its own storage.
#[derive(Clone, Copy)]
enum SelfAddr {
    /// `self.addr`
    Local,
    /// `get_read_ptr(self.cb_id)`
    PipeRead,
    /// `get_write_ptr(self.cb_id)`
    PipeWrite,
}

impl SelfAddr {
    fn render(self, cx: &RuleCx<'_>, m: &MemberMatch<'_>) -> String {
        match self {
            SelfAddr::Local => access(cx, m.self_node, "addr"),
            SelfAddr::PipeRead => format!("get_read_ptr({})", access(cx, m.self_node, "cb_id")),
            SelfAddr::PipeWrite => format!("get_write_ptr({})", access(cx, m.self_node, "cb_id")),
        }
    }
}

/// `<base> + (<expr> << <shift>)`
fn offset(base: String, cx: &RuleCx<'_>, node: Node<'_>, kind: DataKind) -> String {
    format!("{base} + ({})", shifted(cx, node, kind))
}

/// Remote address of the peer buffer in `arg1`.
fn peer_addr(cx: &RuleCx<'_>, arg1: Node<'_>, peer: &str, idx: Node<'_>, kind: DataKind) -> String {
    let base = match peer {
        "local" => access(cx, arg1, "addr"),
        _ => format!("get_read_ptr({})", access(cx, arg1, "cb_id")),
    };
    offset(base, cx, idx, kind)
}

/// Peer address for write targets (`pipe` peers are written through their
/// write pointer).
fn peer_write_addr(
    cx: &RuleCx<'_>,
    arg1: Node<'_>,
    peer: &str,
    idx: Node<'_>,
    kind: DataKind,
) -> String {
    let base = match peer {
        "local" => access(cx, arg1, "addr"),
        _ => format!("get_write_ptr({})", access(cx, arg1, "cb_id")),
    };
    offset(base, cx, idx, kind)
}

impl RuleFactory {
    pub(crate) fn local_rules(&self) -> Vec<Rule> {
        vec![
            self.local_get_rule(),
            self.local_set_rule(),
            global_transfer_rule("local-read-global", "local", "read", SelfAddr::Local, true),
            global_dist_rule("local-read-global-dist", "local", "read", SelfAddr::Local, true),
            peer_read_rule("local-read-local", "local", "local", SelfAddr::Local, false),
            peer_read_rule("local-read-local-xy", "local", "local", SelfAddr::Local, true),
            peer_read_rule("local-read-pipe", "local", "pipe", SelfAddr::Local, false),
            peer_read_rule("local-read-pipe-xy", "local", "pipe", SelfAddr::Local, true),
            global_transfer_rule("local-write-global", "local", "write", SelfAddr::Local, false),
            global_dist_rule("local-write-global-dist", "local", "write", SelfAddr::Local, false),
            peer_write_rule("local-write-local", "local", "local", SelfAddr::Local, false),
            peer_write_rule("local-write-local-xy", "local", "local", SelfAddr::Local, true),
            peer_write_rule("local-write-pipe", "local", "pipe", SelfAddr::Local, false),
            peer_write_rule("local-write-pipe-xy", "local", "pipe", SelfAddr::Local, true),
            mcast_rule("local-write-mcast-local", "local", "write_mcast", "local", SelfAddr::Local, false),
            mcast_rule("local-write-mcast-self-local", "local", "write_mcast_with_self", "local", SelfAddr::Local, true),
            mcast_rule("local-write-mcast-pipe", "local", "write_mcast", "pipe", SelfAddr::Local, false),
            mcast_rule("local-write-mcast-self-pipe", "local", "write_mcast_with_self", "pipe", SelfAddr::Local, true),
            move_init_rule("local-move-init", "local"),
            move_rule("local-move-local", "local", "local", SelfAddr::Local),
            move_rule("local-move-pipe", "local", "pipe", SelfAddr::Local),
        ]
    }

    pub(crate) fn pipe_transfer_rules(&self) -> Vec<Rule> {
        vec![
            global_transfer_rule("pipe-read-global", "pipe", "read", SelfAddr::PipeWrite, true),
            global_dist_rule("pipe-read-global-dist", "pipe", "read", SelfAddr::PipeWrite, true),
            peer_read_rule("pipe-read-local", "pipe", "local", SelfAddr::PipeWrite, false),
            peer_read_rule("pipe-read-local-xy", "pipe", "local", SelfAddr::PipeWrite, true),
            peer_read_rule("pipe-read-pipe", "pipe", "pipe", SelfAddr::PipeWrite, false),
            peer_read_rule("pipe-read-pipe-xy", "pipe", "pipe", SelfAddr::PipeWrite, true),
            global_transfer_rule("pipe-write-global", "pipe", "write", SelfAddr::PipeRead, false),
            global_dist_rule("pipe-write-global-dist", "pipe", "write", SelfAddr::PipeRead, false),
            peer_write_rule("pipe-write-local", "pipe", "local", SelfAddr::PipeRead, false),
            peer_write_rule("pipe-write-local-xy", "pipe", "local", SelfAddr::PipeRead, true),
            peer_write_rule("pipe-write-pipe", "pipe", "pipe", SelfAddr::PipeRead, false),
            peer_write_rule("pipe-write-pipe-xy", "pipe", "pipe", SelfAddr::PipeRead, true),
            mcast_rule("pipe-write-mcast-local", "pipe", "write_mcast", "local", SelfAddr::PipeWrite, false),
            mcast_rule("pipe-write-mcast-self-local", "pipe", "write_mcast_with_self", "local", SelfAddr::PipeWrite, true),
            mcast_rule("pipe-write-mcast-pipe", "pipe", "write_mcast", "pipe", SelfAddr::PipeWrite, false),
            mcast_rule("pipe-write-mcast-self-pipe", "pipe", "write_mcast_with_self", "pipe", SelfAddr::PipeWrite, true),
            move_init_rule("pipe-move-init", "pipe"),
            move_rule("pipe-move-local", "pipe", "local", SelfAddr::PipeWrite),
            move_rule("pipe-move-pipe", "pipe", "pipe", SelfAddr::PipeWrite),
        ]
    }

    pub(crate) fn semaphore_rules(&self) -> Vec<Rule> {
        vec![
            self.semaphore_set_rule(),
            self.semaphore_set_remote_rule(),
            self.semaphore_set_mcast_rule(),
            self.semaphore_inc_rule(),
            self.semaphore_wait_rule(),
        ]
    }

    /// `self.get(index)` =>
    /// `reinterpret_cast<volatile tt_l1_ptr T *>(self.addr)[index]`
    ///
    /// Expression-level rewrite; embedded builtin calls in `index` are not
    /// supported and must be pre-lowered into temporaries.
    pub(crate) fn local_get_rule(&self) -> Rule {
        Rule::new("local-get", |cx, node| {
            let m = match_member_call(cx, node, "local", "get", 1)?;
            let item = m.item()?;
            let out = format!(
                "reinterpret_cast<volatile tt_l1_ptr {} *>({})[{}]",
                item_type(item),
                access(cx, m.self_node, "addr"),
                text(cx, m.args[0])
            );
            Some(Ok(vec![Edit::replace(m.call.byte_range(), out)]))
        })
    }

    /// `self.set(index, value)` =>
    /// `reinterpret_cast<volatile tt_l1_ptr T *>(self.addr)[index] = value;`
    pub(crate) fn local_set_rule(&self) -> Rule {
        Rule::new("local-set", |cx, node| {
            let m = match_member_call(cx, node, "local", "set", 2)?;
            let item = m.item()?;
            let out = format!(
                "reinterpret_cast<volatile tt_l1_ptr {} *>({})[{}] = {};",
                item_type(item),
                access(cx, m.self_node, "addr"),
                text(cx, m.args[0]),
                text(cx, m.args[1])
            );
            Some(Ok(replace_stmt(m.call, out)))
        })
    }

    /// `self.set(value)` => `noc_semaphore_set(cast(self.addr), value);`
    pub(crate) fn semaphore_set_rule(&self) -> Rule {
        Rule::new("semaphore-set", |cx, node| {
            let m = match_member_call(cx, node, "semaphore", "set", 1)?;
            let out = format!(
                "noc_semaphore_set({CAST_PTR_U32}({}), {});",
                access(cx, m.self_node, "addr"),
                text(cx, m.args[0])
            );
            Some(Ok(replace_stmt(m.call, out)))
        })
    }

    /// `self.set_remote(src, x, y)` =>
    /// `noc_semaphore_set_remote(src.addr, get_noc_addr(x, y, self.addr));`
    pub(crate) fn semaphore_set_remote_rule(&self) -> Rule {
        Rule::new("semaphore-set-remote", |cx, node| {
            let m = match_member_call(cx, node, "semaphore", "set_remote", 3)?;
            let out = format!(
                "noc_semaphore_set_remote({}, get_noc_addr({}, {}, {}));",
                access(cx, m.args[0], "addr"),
                text(cx, m.args[1]),
                text(cx, m.args[2]),
                access(cx, m.self_node, "addr")
            );
            Some(Ok(replace_stmt(m.call, out)))
        })
    }

    /// `self.set_mcast(src, x0, y0, x1, y1, n)` =>
    /// `noc_semaphore_set_multicast(src.addr,
    ///      get_noc_multicast_addr(x0, y0, x1, y1, self.addr), n);`
    pub(crate) fn semaphore_set_mcast_rule(&self) -> Rule {
        Rule::new("semaphore-set-mcast", |cx, node| {
            let m = match_member_call(cx, node, "semaphore", "set_mcast", 6)?;
            let out = format!(
                "noc_semaphore_set_multicast({}, get_noc_multicast_addr({}, {}, {}, {}, {}), {});",
                access(cx, m.args[0], "addr"),
                text(cx, m.args[1]),
                text(cx, m.args[2]),
                text(cx, m.args[3]),
                text(cx, m.args[4]),
                access(cx, m.self_node, "addr"),
                text(cx, m.args[5])
            );
            Some(Ok(replace_stmt(m.call, out)))
        })
    }

    /// `self.inc(x, y, value)` =>
    /// `noc_semaphore_inc(get_noc_addr(x, y, self.addr), value);`
    pub(crate) fn semaphore_inc_rule(&self) -> Rule {
        Rule::new("semaphore-inc", |cx, node| {
            let m = match_member_call(cx, node, "semaphore", "inc", 3)?;
            let out = format!(
                "noc_semaphore_inc(get_noc_addr({}, {}, {}), {});",
                text(cx, m.args[0]),
                text(cx, m.args[1]),
                access(cx, m.self_node, "addr"),
                text(cx, m.args[2])
            );
            Some(Ok(replace_stmt(m.call, out)))
        })
    }

    /// `self.wait(value)` => `noc_semaphore_wait(cast(self.addr), value);`
    pub(crate) fn semaphore_wait_rule(&self) -> Rule {
        Rule::new("semaphore-wait", |cx, node| {
            let m = match_member_call(cx, node, "semaphore", "wait", 1)?;
            let out = format!(
                "noc_semaphore_wait({CAST_PTR_U32}({}), {});",
                access(cx, m.self_node, "addr"),
                text(cx, m.args[0])
            );
            Some(Ok(replace_stmt(m.call, out)))
        })
    }

    /// `read_barrier();` => `noc_async_read_barrier();`
    pub(crate) fn func_read_barrier_rule(&self) -> Rule {
        Rule::new("func-read-barrier", |cx, node| {
            match_func_call(cx, node, "read_barrier", 0)?;
            Some(Ok(replace_stmt(node, "noc_async_read_barrier();".into())))
        })
    }

    /// `write_barrier();` => `noc_async_write_barrier();`
    pub(crate) fn func_write_barrier_rule(&self) -> Rule {
        Rule::new("func-write-barrier", |cx, node| {
            match_func_call(cx, node, "write_barrier", 0)?;
            Some(Ok(replace_stmt(node, "noc_async_write_barrier();".into())))
        })
    }
}

fn item_type(kind: DataKind) -> &'static str {
    match kind {
        DataKind::Uint32 => "uint32_t",
        DataKind::Float => "float",
        DataKind::Bfloat16 => "bfloat16_t",
    }
}

/// `self.read/write(off, g, g_off, count)` against a plain global:
/// `noc_async_{read|write}_global_{dram|l1}(self_addr + (off << s),
///      g.addr, g.log2_page_size, g_off << s, count << s);`
fn global_transfer_rule(
    name: &'static str,
    self_class: &'static str,
    method: &'static str,
    self_addr: SelfAddr,
    is_read: bool,
) -> Rule {
    Rule::new(name, move |cx, node| {
        let m = match_member_call(cx, node, self_class, method, 4)?;
        let item = m.item()?;
        let (_, dram) = expr_global(cx, m.args[1])?;
        let api = if is_read {
            "noc_async_read_global_"
        } else {
            "noc_async_write_global_"
        };
        let out = format!(
            "{api}{}({}, {}, {}, {}, {});",
            if dram { "dram" } else { "l1" },
            offset(self_addr.render(cx, &m), cx, m.args[0], item),
            access(cx, m.args[1], "addr"),
            access(cx, m.args[1], "log2_page_size"),
            shifted(cx, m.args[2], item),
            shifted(cx, m.args[3], item)
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

/// `self.read/write(off, g, page, g_off, count)` against a distributed
/// global: `noc_async_{read|write}_{linear|block|cyclic}_dram(...)`.
fn global_dist_rule(
    name: &'static str,
    self_class: &'static str,
    method: &'static str,
    self_addr: SelfAddr,
    is_read: bool,
) -> Rule {
    Rule::new(name, move |cx, node| {
        let m = match_member_call(cx, node, self_class, method, 5)?;
        let item = m.item()?;
        let (dist, _) = expr_global(cx, m.args[1])?;
        let api = if is_read {
            "noc_async_read_"
        } else {
            "noc_async_write_"
        };
        let out = format!(
            "{api}{}_dram({}, {}, {}, {}, {}, {});",
            dist.suffix(),
            offset(self_addr.render(cx, &m), cx, m.args[0], item),
            access(cx, m.args[1], "addr"),
            access(cx, m.args[1], "log2_page_size"),
            text(cx, m.args[2]),
            shifted(cx, m.args[3], item),
            shifted(cx, m.args[4], item)
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

/// `self.read(off, src, src_off, count[, x, y])` from a local/pipe peer:
/// `noc_async_read(get_noc_addr([x, y,] src_addr + (src_off << s)),
///      self_addr + (off << s), count << s);`
fn peer_read_rule(
    name: &'static str,
    self_class: &'static str,
    peer: &'static str,
    self_addr: SelfAddr,
    with_xy: bool,
) -> Rule {
    Rule::new(name, move |cx, node| {
        let argc = if with_xy { 6 } else { 4 };
        let m = match_member_call(cx, node, self_class, "read", argc)?;
        let item = m.item()?;
        if expr_class(cx, m.args[1]) != Some(peer) {
            return None;
        }
        let src = peer_addr(cx, m.args[1], peer, m.args[2], item);
        let src = if with_xy {
            format!(
                "get_noc_addr({}, {}, {src})",
                text(cx, m.args[4]),
                text(cx, m.args[5])
            )
        } else {
            format!("get_noc_addr({src})")
        };
        let out = format!(
            "noc_async_read({src}, {}, {});",
            offset(self_addr.render(cx, &m), cx, m.args[0], item),
            shifted(cx, m.args[3], item)
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

/// `self.write(off, dst, dst_off, count[, x, y])` to a local/pipe peer:
/// `noc_async_write(self_addr + (off << s),
///      get_noc_addr([x, y,] dst_addr + (dst_off << s)), count << s);`
fn peer_write_rule(
    name: &'static str,
    self_class: &'static str,
    peer: &'static str,
    self_addr: SelfAddr,
    with_xy: bool,
) -> Rule {
    Rule::new(name, move |cx, node| {
        let argc = if with_xy { 6 } else { 4 };
        let m = match_member_call(cx, node, self_class, "write", argc)?;
        let item = m.item()?;
        if expr_class(cx, m.args[1]) != Some(peer) {
            return None;
        }
        let dst = peer_write_addr(cx, m.args[1], peer, m.args[2], item);
        let dst = if with_xy {
            format!(
                "get_noc_addr({}, {}, {dst})",
                text(cx, m.args[4]),
                text(cx, m.args[5])
            )
        } else {
            format!("get_noc_addr({dst})")
        };
        let out = format!(
            "noc_async_write({}, {dst}, {});",
            offset(self_addr.render(cx, &m), cx, m.args[0], item),
            shifted(cx, m.args[3], item)
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

/// `self.write_mcast[_with_self](off, dst, dst_off, count,
///      x0, y0, x1, y1, num_dests)` =>
/// `noc_async_write_multicast[_loopback_src](self_addr + (off << s),
///      get_noc_multicast_addr(x0, y0, x1, y1, dst_addr + (dst_off << s)),
///      count << s, num_dests);`
fn mcast_rule(
    name: &'static str,
    self_class: &'static str,
    method: &'static str,
    peer: &'static str,
    self_addr: SelfAddr,
    loopback: bool,
) -> Rule {
    Rule::new(name, move |cx, node| {
        let m = match_member_call(cx, node, self_class, method, 9)?;
        let item = m.item()?;
        if expr_class(cx, m.args[1]) != Some(peer) {
            return None;
        }
        let api = if loopback {
            "noc_async_write_multicast_loopback_src"
        } else {
            "noc_async_write_multicast"
        };
        let dst = peer_write_addr(cx, m.args[1], peer, m.args[2], item);
        let out = format!(
            "{api}({}, get_noc_multicast_addr({}, {}, {}, {}, {dst}), {}, {});",
            offset(self_addr.render(cx, &m), cx, m.args[0], item),
            text(cx, m.args[4]),
            text(cx, m.args[5]),
            text(cx, m.args[6]),
            text(cx, m.args[7]),
            shifted(cx, m.args[3], item),
            text(cx, m.args[8])
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

/// `self.move_init(count)` =>
/// `noc_async_read_one_packet_set_state(get_noc_addr(0), count << s);`
fn move_init_rule(name: &'static str, self_class: &'static str) -> Rule {
    Rule::new(name, move |cx, node| {
        let m = match_member_call(cx, node, self_class, "move_init", 1)?;
        let item = m.item()?;
        let out = format!(
            "noc_async_read_one_packet_set_state(get_noc_addr(0), {});",
            shifted(cx, m.args[0], item)
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

/// `self.move(dst_off, src, src_off)` =>
/// `noc_async_read_one_packet_with_state(src_addr + (src_off << s),
///      self_addr + (dst_off << s));`
fn move_rule(
    name: &'static str,
    self_class: &'static str,
    peer: &'static str,
    self_addr: SelfAddr,
) -> Rule {
    Rule::new(name, move |cx, node| {
        let m = match_member_call(cx, node, self_class, "move", 3)?;
        let item = m.item()?;
        if expr_class(cx, m.args[1]) != Some(peer) {
            return None;
        }
        let src = peer_addr(cx, m.args[1], peer, m.args[2], item);
        let out = format!(
            "noc_async_read_one_packet_with_state({src}, {});",
            offset(self_addr.render(cx, &m), cx, m.args[0], item)
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}
