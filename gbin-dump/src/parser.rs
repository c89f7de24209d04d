use nom::{
    Finish,
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    combinator::{all_consuming, map, opt, value},
    multi::separated_list0,
    sequence::{delimited, preceded, terminated, tuple},
};
use gbin::Shape;
use anyhow::{anyhow, Result};

const WHITESPACE: &'static str = " \t\r\n";

fn white(i: &str) -> IResult<&str, &str> {
    take_while(move |c| WHITESPACE.contains(c))(i)
}

fn scalar(i: &str) -> IResult<&str, Shape> {
    alt((
        value(Shape::Any, tag("any")),
        value(Shape::Bool, tag("bool")),
        value(Shape::Int64, tag("int64")),
        value(Shape::Int, tag("int")),
        value(Shape::UInt64, tag("uint64")),
        value(Shape::UInt, tag("uint")),
        value(Shape::Byte, tag("byte")),
        value(Shape::Float64, tag("float64")),
        value(Shape::String, tag("string")),
    ))(i)
}

fn pointer(i: &str) -> IResult<&str, Shape> {
    map(preceded(tag("*"), shape), Shape::pointer)(i)
}

fn sequence(i: &str) -> IResult<&str, Shape> {
    map(preceded(tag("[]"), shape), Shape::sequence)(i)
}

fn map_of(i: &str) -> IResult<&str, Shape> {
    map(
        tuple((tag("map["), delimited(white, shape, white), tag("]"), shape)),
        |(_, k, _, v)| Shape::map(k, v)
    )(i)
}

fn name(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(i)
}

fn field(i: &str) -> IResult<&str, (String, Shape)> {
    map(tuple((name, white, tag(":"), white, shape)), |(n, _, _, _, s)| (n.to_owned(), s))(i)
}

fn structure(i: &str) -> IResult<&str, Shape> {
    map(
        delimited(
            tuple((tag("struct"), white, tag("{"), white)),
            terminated(
                separated_list0(tuple((white, tag(","), white)), field),
                tuple((white, opt(tag(",")), white)),
            ),
            tag("}"),
        ),
        Shape::Struct
    )(i)
}

fn shape(i: &str) -> IResult<&str, Shape> {
    alt((structure, map_of, pointer, sequence, scalar))(i)
}

pub fn parse(i: &str) -> Result<Shape> {
    Ok(all_consuming(delimited(white, shape, white))(i).finish().map_err(|e| anyhow!("Invalid shape: {}", e))?.1)
}
